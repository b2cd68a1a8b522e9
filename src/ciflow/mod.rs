use std::sync::Arc;

use axum::async_trait;

use crate::github::{CommitSha, GithubRepoName, PullRequestNumber, TagName, TagRef};

mod comment;
mod context;
pub mod event;
mod handlers;
pub mod labels;
pub mod tags;

pub use comment::Comment;
pub use context::CiflowContext;
pub use handlers::handle_ciflow_event;

/// Provides functionality for working with a remote repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    fn repository(&self) -> &GithubRepoName;

    /// Return all tag refs whose name starts with the given `tag`.
    /// The result may contain stale entries and refs that merely share the prefix.
    async fn list_matching_tags(&self, tag: &TagName) -> anyhow::Result<Vec<TagRef>>;

    /// Create the given tag at the commit with the given `sha`.
    async fn create_tag(&self, tag: &TagName, sha: &CommitSha) -> anyhow::Result<()>;

    /// Delete the given tag. Deleting a tag that does not exist is not an error.
    async fn delete_tag(&self, tag: &TagName) -> anyhow::Result<()>;

    /// Post a comment to the pull request with the given number.
    async fn post_comment(&self, pr: PullRequestNumber, comment: Comment) -> anyhow::Result<()>;
}

/// Main state holder for the bot.
/// It is behind a trait to allow easier mocking in tests.
#[async_trait]
pub trait CiflowState<Client: RepositoryClient>: Send + Sync {
    /// Get repository state for the given repository name.
    fn get_repo_state(&self, repo: &GithubRepoName) -> Option<Arc<RepositoryState<Client>>>;

    /// Reload state of repositories due to some external change.
    async fn reload_repositories(&self) -> anyhow::Result<()>;
}

/// An access point to a single repository.
pub struct RepositoryState<Client: RepositoryClient> {
    pub repository: GithubRepoName,
    pub client: Client,
}
