use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::github::GithubRepoName;

/// Policy used when no policy file is passed on the command line.
pub const DEFAULT_POLICY: &str = include_str!("../ciflow.toml");

/// Label policy of the bot, loaded from a `ciflow.toml` file.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Labels starting with one of these prefixes are CI trigger labels.
    #[serde(default = "default_trigger_prefixes")]
    pub trigger_prefixes: Vec<String>,
    /// Trigger labels that are mirrored into tags.
    #[serde(default)]
    pub labels: Vec<ActionableLabel>,
    /// Notes posted when somebody applies a trigger label that is no longer supported.
    #[serde(default)]
    pub retired_labels: HashMap<String, String>,
    /// Pull requests that never receive tags.
    #[serde(default)]
    pub exempt: Vec<ExemptPullRequest>,
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionableLabel {
    pub name: String,
    pub description: Option<String>,
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExemptPullRequest {
    pub repository: GithubRepoName,
    pub number: u64,
}

fn default_trigger_prefixes() -> Vec<String> {
    vec!["ciflow/".to_string(), "ci/".to_string()]
}

impl PolicyConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: PolicyConfig = toml::from_str(text).context("Cannot parse policy config")?;
        if let Some(label) = config
            .labels
            .iter()
            .find(|label| !config.trigger_prefixes.iter().any(|p| label.name.starts_with(p)))
        {
            return Err(anyhow::anyhow!(
                "Label `{}` does not start with any trigger prefix {:?}",
                label.name,
                config.trigger_prefixes
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read policy config from {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(DEFAULT_POLICY)
    }
}
