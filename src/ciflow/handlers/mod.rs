use std::sync::Arc;

use tracing::Instrument;

use crate::ciflow::event::CiflowEvent;
use crate::ciflow::handlers::pr_events::handle_pull_request_event;
use crate::ciflow::{CiflowContext, CiflowState, RepositoryClient};

mod pr_events;

/// This function executes a single CIFlow event.
/// Errors of tag operations are returned to the caller, which is expected to log them.
pub async fn handle_ciflow_event<Client: RepositoryClient>(
    event: CiflowEvent,
    state: Arc<dyn CiflowState<Client>>,
    ctx: Arc<CiflowContext>,
) -> anyhow::Result<()> {
    match event {
        CiflowEvent::PullRequest(payload) => {
            let Some(repo) = state.get_repo_state(&payload.repository) else {
                return Err(anyhow::anyhow!(
                    "Repository {} not found in the bot state",
                    payload.repository
                ));
            };

            let span = tracing::info_span!(
                "PullRequest",
                pr = format!("{}#{}", repo.client.repository(), payload.pull_request.number),
                action = ?payload.action
            );
            handle_pull_request_event(repo, &ctx.policy, payload)
                .instrument(span)
                .await?;
        }
        CiflowEvent::InstallationsChanged => {
            let span = tracing::info_span!("Installations changed");
            tracing::info!(parent: &span, "Reloading installation repositories");
            state
                .reload_repositories()
                .instrument(span)
                .await
                .map_err(|error| {
                    anyhow::anyhow!("Could not reload installation repositories: {error:?}")
                })?;
        }
    }
    Ok(())
}
