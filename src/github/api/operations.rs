use http::StatusCode;
use octocrab::params::repos::Reference;
use thiserror::Error;

use crate::github::api::client::GithubRepositoryClient;
use crate::github::{CommitSha, TagName, TagRef};

#[derive(Error, Debug)]
pub enum TagOperationError {
    #[error("Tag was not found")]
    NotFound,
    #[error("Unknown error ({status}): {text}")]
    Unknown { status: StatusCode, text: String },
    #[error("Network error: {0}")]
    Network(#[from] octocrab::Error),
}

#[derive(serde::Deserialize, Debug)]
struct MatchingRefObject {
    sha: String,
}

#[derive(serde::Deserialize, Debug)]
struct MatchingRef {
    #[serde(rename = "ref")]
    ref_path: String,
    object: MatchingRefObject,
}

/// Lists all tag refs whose name starts with `tag`.
///
/// Documentation: https://docs.github.com/en/rest/git/refs?apiVersion=2022-11-28#list-matching-references
pub async fn list_matching_tags(
    repo: &GithubRepositoryClient,
    tag: &TagName,
) -> Result<Vec<TagRef>, TagOperationError> {
    let url = format!(
        "/repos/{}/git/matching-refs/{}",
        repo.name(),
        tag.ref_url()
    );
    let refs: Vec<MatchingRef> = repo.client().get(url, None::<&()>).await?;
    Ok(refs
        .into_iter()
        .map(|matching| TagRef {
            ref_path: matching.ref_path,
            sha: CommitSha(matching.object.sha),
        })
        .collect())
}

/// Creates a new tag ref pointing to `sha`.
pub async fn create_tag(
    repo: &GithubRepositoryClient,
    tag: &TagName,
    sha: &CommitSha,
) -> Result<(), TagOperationError> {
    repo.client()
        .repos(repo.name().owner(), repo.name().name())
        .create_ref(&Reference::Tag(tag.to_string()), sha.as_ref())
        .await?;
    Ok(())
}

/// Deletes the tag ref.
///
/// Documentation: https://docs.github.com/en/rest/git/refs?apiVersion=2022-11-28#delete-a-reference
pub async fn delete_tag(
    repo: &GithubRepositoryClient,
    tag: &TagName,
) -> Result<(), TagOperationError> {
    let url = format!("/repos/{}/git/refs/{}", repo.name(), tag.ref_url());
    tracing::debug!("Deleting ref {url}");

    let res = repo.client()._delete(url.as_str(), None::<&()>).await?;
    let status = res.status();
    let text = repo.client().body_to_string(res).await.unwrap_or_default();
    tracing::trace!("Deleting ref response: status={status}, text={text:?}");

    match status {
        StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
        // GitHub answers 422 "Reference does not exist" for refs that are already gone.
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            Err(TagOperationError::NotFound)
        }
        _ => Err(TagOperationError::Unknown { status, text }),
    }
}
