//! Contains definitions of common types (pull request, tag, repository name) needed
//! for working with (GitHub) repositories.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod api;
pub mod server;
mod webhook;

pub use api::GithubAppState;
pub use webhook::WebhookSecret;

/// Unique identifier of a GitHub repository
#[derive(Debug, PartialEq, Eq, Hash, Clone, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct GithubRepoName {
    owner: String,
    name: String,
}

impl GithubRepoName {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for GithubRepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.name))
    }
}

impl FromStr for GithubRepoName {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(anyhow::anyhow!(
                "Repository name `{value}` is not in the `owner/name` format"
            )),
        }
    }
}

impl TryFrom<String> for GithubRepoName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommitSha(pub String);

impl From<String> for CommitSha {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<&str> for CommitSha {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl AsRef<str> for CommitSha {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
impl Display for CommitSha {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PullRequestNumber(pub u64);

impl From<u64> for PullRequestNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PullRequestNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Closed,
}

#[derive(Clone, Debug)]
pub struct PullRequest {
    pub number: PullRequestNumber,
    pub head_sha: CommitSha,
    pub state: PullRequestState,
    /// Names of all labels attached to the PR when the event was sent.
    pub labels: Vec<String>,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open
    }
}

/// Name of a git tag that mirrors a trigger label on a single pull request,
/// e.g. `ciflow/trunk/12345`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagName(String);

impl TagName {
    pub fn new(label: &str, pr: PullRequestNumber) -> Self {
        Self(format!("{label}/{pr}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified ref, e.g. `refs/tags/ciflow/trunk/12345`.
    pub fn ref_path(&self) -> String {
        format!("refs/tags/{}", self.0)
    }

    /// The ref as it appears in git-refs API URLs, e.g. `tags/ciflow/trunk/12345`.
    pub fn ref_url(&self) -> String {
        format!("tags/{}", self.0)
    }
}

impl Display for TagName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A tag ref as reported by the remote repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRef {
    /// Fully qualified ref path (`refs/tags/...`).
    pub ref_path: String,
    pub sha: CommitSha,
}
