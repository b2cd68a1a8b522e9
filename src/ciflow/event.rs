use crate::github::{GithubRepoName, PullRequest};

#[derive(Debug)]
pub enum CiflowEvent {
    /// Something has happened to a pull request.
    PullRequest(PullRequestEvent),
    /// The configuration of some repository has been changed for the bot's Github App.
    InstallationsChanged,
}

#[derive(Debug)]
pub struct PullRequestEvent {
    pub repository: GithubRepoName,
    pub pull_request: PullRequest,
    pub action: PullRequestAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    /// A label was added to the PR.
    Labeled { label: String },
    /// A label was removed from the PR.
    Unlabeled { label: String },
    /// New commits were pushed to the PR.
    Synchronized,
    Opened,
    Reopened,
    Closed,
}
