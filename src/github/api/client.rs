use anyhow::Context;
use axum::async_trait;
use octocrab::Octocrab;

use crate::ciflow::{Comment, RepositoryClient};
use crate::github::api::operations::{self, TagOperationError};
use crate::github::{CommitSha, GithubRepoName, PullRequestNumber, TagName, TagRef};

/// Provides access to a single app installation (repository) using the GitHub API.
pub struct GithubRepositoryClient {
    /// The client caches the access token for this given repository and refreshes it once it
    /// expires.
    pub client: Octocrab,
    pub repo_name: GithubRepoName,
}

impl GithubRepositoryClient {
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    pub fn name(&self) -> &GithubRepoName {
        &self.repo_name
    }
}

#[async_trait]
impl RepositoryClient for GithubRepositoryClient {
    fn repository(&self) -> &GithubRepoName {
        self.name()
    }

    async fn list_matching_tags(&self, tag: &TagName) -> anyhow::Result<Vec<TagRef>> {
        operations::list_matching_tags(self, tag)
            .await
            .with_context(|| format!("Cannot list tags matching {tag} in {}", self.name()))
    }

    async fn create_tag(&self, tag: &TagName, sha: &CommitSha) -> anyhow::Result<()> {
        operations::create_tag(self, tag, sha)
            .await
            .with_context(|| format!("Cannot create tag {tag} in {}", self.name()))
    }

    async fn delete_tag(&self, tag: &TagName) -> anyhow::Result<()> {
        match operations::delete_tag(self, tag).await {
            Ok(()) => Ok(()),
            Err(TagOperationError::NotFound) => {
                tracing::trace!("Trying to delete tag {tag} which does not exist");
                Ok(())
            }
            Err(error) => Err(error)
                .with_context(|| format!("Cannot delete tag {tag} in {}", self.name())),
        }
    }

    /// The comment will be posted as the Github App user of the bot.
    async fn post_comment(&self, pr: PullRequestNumber, comment: Comment) -> anyhow::Result<()> {
        self.client
            .issues(self.name().owner(), self.name().name())
            .create_comment(pr.0, comment.render())
            .await
            .with_context(|| format!("Cannot post comment to {}#{pr}", self.name()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use octocrab::Octocrab;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::ciflow::tags::remove_tag;
    use crate::ciflow::RepositoryClient;
    use crate::github::api::client::GithubRepositoryClient;
    use crate::github::{CommitSha, GithubRepoName, TagRef};
    use crate::tests::state::tag;

    const TAG_REF_PATH: &str = "/repos/owner/name/git/refs/tags/ciflow/trunk/1";
    const MATCHING_REFS_PATH: &str = "/repos/owner/name/git/matching-refs/tags/ciflow/trunk/1";

    async fn create_client(mock_server: &MockServer) -> GithubRepositoryClient {
        let client = Octocrab::builder()
            .base_uri(mock_server.uri())
            .unwrap()
            .build()
            .unwrap();
        GithubRepositoryClient {
            client,
            repo_name: GithubRepoName::new("owner", "name"),
        }
    }

    async fn delete_with_status(status: u16) -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(TAG_REF_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
        let client = create_client(&mock_server).await;
        client.delete_tag(&tag("ciflow/trunk", 1)).await
    }

    fn matching_refs() -> serde_json::Value {
        serde_json::json!([
            {
                "ref": "refs/tags/ciflow/trunk/1",
                "node_id": "REF_1",
                "url": "https://api.github.com/repos/owner/name/git/refs/tags/ciflow/trunk/1",
                "object": {"type": "commit", "sha": "sha1", "url": "https://api.github.com/commit/sha1"}
            },
            {
                "ref": "refs/tags/ciflow/trunk/12",
                "node_id": "REF_12",
                "url": "https://api.github.com/repos/owner/name/git/refs/tags/ciflow/trunk/12",
                "object": {"type": "commit", "sha": "sha12", "url": "https://api.github.com/commit/sha12"}
            }
        ])
    }

    #[tokio::test]
    async fn delete_existing_tag() {
        delete_with_status(204).await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_tag_not_found() {
        delete_with_status(404).await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_tag_unprocessable() {
        delete_with_status(422).await.unwrap();
    }

    #[tokio::test]
    async fn delete_tag_server_error() {
        let error = delete_with_status(500).await.unwrap_err();
        let message = format!("{error:?}");
        assert!(message.contains("Cannot delete tag ciflow/trunk/1 in owner/name"));
        assert!(message.contains("Unknown error (500"));
    }

    #[tokio::test]
    async fn list_decodes_matching_refs() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MATCHING_REFS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(matching_refs()))
            .mount(&mock_server)
            .await;
        let client = create_client(&mock_server).await;

        let refs = client
            .list_matching_tags(&tag("ciflow/trunk", 1))
            .await
            .unwrap();
        assert_eq!(
            refs,
            vec![
                TagRef {
                    ref_path: "refs/tags/ciflow/trunk/1".to_string(),
                    sha: CommitSha::from("sha1"),
                },
                TagRef {
                    ref_path: "refs/tags/ciflow/trunk/12".to_string(),
                    sha: CommitSha::from("sha12"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn remove_skips_ref_sharing_prefix() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MATCHING_REFS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(matching_refs()))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(TAG_REF_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/owner/name/git/refs/tags/ciflow/trunk/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&mock_server)
            .await;
        let client = create_client(&mock_server).await;

        assert!(remove_tag(&client, &tag("ciflow/trunk", 1)).await.unwrap());
    }
}
