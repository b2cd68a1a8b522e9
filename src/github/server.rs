use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::mpsc;
use tower::limit::ConcurrencyLimitLayer;
use tracing::Instrument;

use crate::ciflow::event::CiflowEvent;
use crate::ciflow::{handle_ciflow_event, CiflowContext, CiflowState, RepositoryClient};
use crate::github::webhook::GitHubWebhook;
use crate::github::webhook::WebhookSecret;
use crate::utils::logging::LogError;

/// Shared server state for all axum handlers.
pub struct ServerState {
    event_queue: mpsc::Sender<CiflowEvent>,
    webhook_secret: WebhookSecret,
}

impl ServerState {
    pub fn new(event_queue: mpsc::Sender<CiflowEvent>, webhook_secret: WebhookSecret) -> Self {
        Self {
            event_queue,
            webhook_secret,
        }
    }

    pub fn get_webhook_secret(&self) -> &WebhookSecret {
        &self.webhook_secret
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/github", post(github_webhook_handler))
        .route("/health", get(health_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

/// Axum handler that receives a webhook and sends it to a webhook channel.
pub async fn github_webhook_handler(
    State(state): State<ServerStateRef>,
    GitHubWebhook(event): GitHubWebhook,
) -> impl IntoResponse {
    match state.event_queue.send(event).await {
        Ok(_) => (StatusCode::OK, ""),
        Err(err) => {
            tracing::error!("Could not send webhook event: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

/// Creates a future with a process that continuously receives webhook events and reacts to
/// them. Events are handled one at a time, in the order in which they were received.
pub fn create_ciflow_process<Client: RepositoryClient + 'static>(
    state: Arc<dyn CiflowState<Client>>,
    ctx: CiflowContext,
) -> (mpsc::Sender<CiflowEvent>, impl Future<Output = ()>) {
    let (tx, mut rx) = mpsc::channel::<CiflowEvent>(1024);
    let ctx = Arc::new(ctx);

    let service = async move {
        while let Some(event) = rx.recv().await {
            let span = tracing::info_span!("Event");
            tracing::trace!(parent: &span, "Received webhook: {event:#?}");

            if let Err(error) = handle_ciflow_event(event, Arc::clone(&state), Arc::clone(&ctx))
                .instrument(span.clone())
                .await
            {
                span.log_error(error);
            }
        }
    };
    (tx, service)
}
