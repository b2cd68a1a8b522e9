use std::sync::Arc;

use anyhow::Context;

use crate::ciflow::comment::unsupported_label_comment;
use crate::ciflow::event::{PullRequestAction, PullRequestEvent};
use crate::ciflow::labels::LabelPolicy;
use crate::ciflow::tags::{remove_tag, remove_tags, sync_tag, sync_tags};
use crate::ciflow::{RepositoryClient, RepositoryState};
use crate::github::{PullRequest, TagName};

pub(super) async fn handle_pull_request_event<Client: RepositoryClient>(
    repo: Arc<RepositoryState<Client>>,
    policy: &LabelPolicy,
    payload: PullRequestEvent,
) -> anyhow::Result<()> {
    let pr = &payload.pull_request;
    match &payload.action {
        PullRequestAction::Labeled { label } => handle_labeled(&repo, policy, pr, label).await,
        PullRequestAction::Unlabeled { label } => handle_unlabeled(&repo, policy, pr, label).await,
        PullRequestAction::Synchronized
        | PullRequestAction::Opened
        | PullRequestAction::Reopened => handle_push(&repo, policy, pr).await,
        PullRequestAction::Closed => handle_closed(&repo, policy, pr).await,
    }
}

/// Adds the tag corresponding to the new label.
async fn handle_labeled<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    policy: &LabelPolicy,
    pr: &PullRequest,
    label: &str,
) -> anyhow::Result<()> {
    // If the PR is reopened, its tags will be pushed as part of the reopen handling.
    if !pr.is_open() {
        tracing::debug!("Ignoring label {label} on closed PR");
        return Ok(());
    }
    if !policy.is_trigger_label(label) {
        return Ok(());
    }

    if !policy.is_actionable(label) {
        tracing::info!("Label {label} is not supported, posting guidance");
        return repo
            .client
            .post_comment(pr.number, unsupported_label_comment(label, policy))
            .await
            .context("Cannot post unsupported label comment");
    }

    if policy.is_exempt(&repo.repository, pr.number) {
        tracing::info!("PR is exempt from CIFlow tags");
        return Ok(());
    }

    sync_tag(&repo.client, &TagName::new(label, pr.number), &pr.head_sha).await?;
    Ok(())
}

/// Removes the tag corresponding to the removed label.
async fn handle_unlabeled<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    policy: &LabelPolicy,
    pr: &PullRequest,
    label: &str,
) -> anyhow::Result<()> {
    if !policy.is_trigger_label(label) {
        return Ok(());
    }
    remove_tag(&repo.client, &TagName::new(label, pr.number)).await?;
    Ok(())
}

/// Makes sure that the tags of all trigger labels on the PR point to its head.
async fn handle_push<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    policy: &LabelPolicy,
    pr: &PullRequest,
) -> anyhow::Result<()> {
    let tags = pr_tags(policy, pr);
    tracing::debug!("Synchronizing tags {tags:?} to {}", pr.head_sha);
    sync_tags(&repo.client, &tags, &pr.head_sha).await
}

/// Removes all tags of the PR, as it was closed.
async fn handle_closed<Client: RepositoryClient>(
    repo: &RepositoryState<Client>,
    policy: &LabelPolicy,
    pr: &PullRequest,
) -> anyhow::Result<()> {
    let tags = pr_tags(policy, pr);
    tracing::debug!("Removing tags {tags:?}");
    remove_tags(&repo.client, &tags).await
}

fn pr_tags(policy: &LabelPolicy, pr: &PullRequest) -> Vec<TagName> {
    let labels = policy.trigger_labels(&pr.labels);
    tracing::info!("Found labels on PR: {labels:?}");
    labels
        .into_iter()
        .map(|label| TagName::new(label, pr.number))
        .collect()
}
