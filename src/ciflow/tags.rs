//! Keeps `<label>/<pr>` tags pointed at the head commit of their pull request.
//!
//! Git refs cannot be moved in place through the API, so a tag is re-pointed by deleting
//! the stale ref and creating a new one. All operations here are idempotent: running them
//! again with the same arguments converges to the same remote state.
use anyhow::Context;
use itertools::Itertools;

use crate::ciflow::RepositoryClient;
use crate::github::{CommitSha, TagName, TagRef};

/// What [`sync_tag`] had to do to make the tag point at the requested commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSync {
    /// The tag already pointed at the commit.
    Unchanged,
    /// The tag did not exist and was created.
    Created,
    /// A stale tag was deleted and created again at the commit.
    Moved,
}

/// Make sure that `tag` points to `sha`, deleting out of date refs as necessary.
///
/// If any exact match already points to `sha` it takes precedence and nothing is changed,
/// even when the listing also reports stale entries for the same path. Otherwise the stale
/// ref is deleted and on success exactly one ref named `refs/tags/<tag>` points to `sha`.
pub async fn sync_tag<Client: RepositoryClient>(
    client: &Client,
    tag: &TagName,
    sha: &CommitSha,
) -> anyhow::Result<TagSync> {
    tracing::info!("Synchronizing tag {tag} to head sha {sha}");
    let matching = find_exact_matches(client, tag).await?;

    if matching.iter().any(|tag_ref| &tag_ref.sha == sha) {
        tracing::info!("Tag {tag} already points to {sha}");
        return Ok(TagSync::Unchanged);
    }

    // All exact matches share the canonical path, so the ref is deleted once no matter
    // how many stale entries the listing returned.
    let stale: Vec<&TagRef> = matching
        .iter()
        .unique_by(|tag_ref| tag_ref.ref_path.clone())
        .collect();
    for tag_ref in &stale {
        tracing::info!("Deleting out of date tag {tag} on sha {}", tag_ref.sha);
        client
            .delete_tag(tag)
            .await
            .with_context(|| format!("Cannot delete out of date tag {tag}"))?;
    }

    tracing::info!("Creating tag {tag} on head sha {sha}");
    client
        .create_tag(tag, sha)
        .await
        .with_context(|| format!("Cannot create tag {tag} on {sha}"))?;

    Ok(if stale.is_empty() {
        TagSync::Created
    } else {
        TagSync::Moved
    })
}

/// Remove `tag` from the repository if it exists.
///
/// At most one ref is deleted. Returns `true` if a ref was deleted.
pub async fn remove_tag<Client: RepositoryClient>(
    client: &Client,
    tag: &TagName,
) -> anyhow::Result<bool> {
    tracing::info!("Cleaning up tag {tag}");
    let matching = find_exact_matches(client, tag).await?;

    match matching.first() {
        Some(tag_ref) => {
            tracing::info!("Deleting tag {tag} on sha {}", tag_ref.sha);
            client
                .delete_tag(tag)
                .await
                .with_context(|| format!("Cannot delete tag {tag}"))?;
            Ok(true)
        }
        None => {
            tracing::info!("No matching tags for {tag}");
            Ok(false)
        }
    }
}

/// Synchronize all `tags` to `sha` concurrently.
///
/// Every tag is attempted even if some of them fail; the first error is returned afterwards.
pub async fn sync_tags<Client: RepositoryClient>(
    client: &Client,
    tags: &[TagName],
    sha: &CommitSha,
) -> anyhow::Result<()> {
    futures::future::join_all(tags.iter().map(|tag| sync_tag(client, tag, sha)))
        .await
        .into_iter()
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(())
}

/// Remove all `tags` concurrently.
///
/// Every tag is attempted even if some of them fail; the first error is returned afterwards.
pub async fn remove_tags<Client: RepositoryClient>(
    client: &Client,
    tags: &[TagName],
) -> anyhow::Result<()> {
    futures::future::join_all(tags.iter().map(|tag| remove_tag(client, tag)))
        .await
        .into_iter()
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(())
}

/// Lists refs matching `tag` and drops those that only share its prefix
/// (`ciflow/trunk/12` when looking for `ciflow/trunk/1`).
async fn find_exact_matches<Client: RepositoryClient>(
    client: &Client,
    tag: &TagName,
) -> anyhow::Result<Vec<TagRef>> {
    let refs = client
        .list_matching_tags(tag)
        .await
        .with_context(|| format!("Cannot list refs matching tag {tag}"))?;
    if refs.is_empty() {
        tracing::info!("No matching tags");
    } else {
        tracing::debug!("Found matching tags: {refs:?}");
    }

    let ref_path = tag.ref_path();
    let (exact, overlapping): (Vec<TagRef>, Vec<TagRef>) = refs
        .into_iter()
        .partition(|tag_ref| tag_ref.ref_path == ref_path);
    if !overlapping.is_empty() {
        tracing::trace!("Ignoring refs that only share the prefix of {tag}: {overlapping:?}");
    }
    Ok(exact)
}
