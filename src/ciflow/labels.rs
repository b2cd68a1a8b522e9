//! Classification of PR labels into CI trigger labels.
use std::collections::{HashMap, HashSet};

use crate::config::{ActionableLabel, PolicyConfig};
use crate::github::{GithubRepoName, PullRequestNumber};

/// Decides which labels are mirrored into tags.
#[derive(Debug)]
pub struct LabelPolicy {
    trigger_prefixes: Vec<String>,
    labels: Vec<ActionableLabel>,
    actionable: HashSet<String>,
    retired: HashMap<String, String>,
    exempt: HashSet<(GithubRepoName, PullRequestNumber)>,
}

impl LabelPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        let actionable = config
            .labels
            .iter()
            .map(|label| label.name.clone())
            .collect();
        let exempt = config
            .exempt
            .into_iter()
            .map(|pr| (pr.repository, PullRequestNumber(pr.number)))
            .collect();
        Self {
            trigger_prefixes: config.trigger_prefixes,
            labels: config.labels,
            actionable,
            retired: config.retired_labels,
            exempt,
        }
    }

    /// Does the label request some CI workflow?
    pub fn is_trigger_label(&self, name: &str) -> bool {
        self.trigger_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Is the label one of the currently supported trigger labels?
    pub fn is_actionable(&self, name: &str) -> bool {
        self.actionable.contains(name)
    }

    pub fn is_exempt(&self, repo: &GithubRepoName, pr: PullRequestNumber) -> bool {
        self.exempt.contains(&(repo.clone(), pr))
    }

    pub fn retired_note(&self, name: &str) -> Option<&str> {
        self.retired.get(name).map(|note| note.as_str())
    }

    /// Supported labels, in configuration order.
    pub fn actionable_labels(&self) -> &[ActionableLabel] {
        &self.labels
    }

    /// Filters the trigger labels out of all labels attached to a PR.
    pub fn trigger_labels<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .map(|label| label.as_str())
            .filter(|label| self.is_trigger_label(label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::LabelPolicy;
    use crate::config::PolicyConfig;
    use crate::github::{GithubRepoName, PullRequestNumber};

    fn policy() -> LabelPolicy {
        LabelPolicy::new(PolicyConfig::builtin().unwrap())
    }

    #[test]
    fn trigger_labels_by_prefix() {
        let policy = policy();
        assert!(policy.is_trigger_label("ciflow/trunk"));
        assert!(policy.is_trigger_label("ciflow/all"));
        assert!(policy.is_trigger_label("ci/foo"));
        assert!(!policy.is_trigger_label("bug"));
        assert!(!policy.is_trigger_label("ciflow"));
        assert!(!policy.is_trigger_label("ciflowtrunk"));
        assert!(!policy.is_trigger_label("module: ci/cd"));
    }

    #[test]
    fn actionable_labels_from_allow_list() {
        let policy = policy();
        assert!(policy.is_actionable("ciflow/trunk"));
        assert!(policy.is_actionable("ciflow/mps"));
        assert!(policy.is_actionable("ciflow/binaries_wheel"));
        assert!(!policy.is_actionable("ciflow/all"));
        assert!(!policy.is_actionable("ci/foo"));
        assert!(!policy.is_actionable("ciflow/trunk/"));
    }

    #[test]
    fn exempt_pull_request() {
        let policy = policy();
        let pytorch = GithubRepoName::new("PyTorch", "PyTorch");
        assert!(policy.is_exempt(&pytorch, PullRequestNumber(26921)));
        assert!(!policy.is_exempt(&pytorch, PullRequestNumber(26922)));
        assert!(!policy.is_exempt(
            &GithubRepoName::new("pytorch", "vision"),
            PullRequestNumber(26921)
        ));
    }

    #[test]
    fn filter_trigger_labels() {
        let policy = policy();
        let labels = vec![
            "ciflow/trunk".to_string(),
            "bug".to_string(),
            "ci/foo".to_string(),
        ];
        assert_eq!(policy.trigger_labels(&labels), vec!["ciflow/trunk", "ci/foo"]);
    }

    #[test]
    fn retired_label_note() {
        let policy = policy();
        assert!(policy
            .retired_note("ciflow/all")
            .unwrap()
            .starts_with("The `ciflow/all` label was recently removed."));
        assert_eq!(policy.retired_note("ciflow/trunk"), None);
    }
}
