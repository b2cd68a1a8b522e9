use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::ciflow::event::{CiflowEvent, PullRequestAction, PullRequestEvent};
use crate::github::server::ServerStateRef;
use crate::github::{CommitSha, GithubRepoName, PullRequest, PullRequestState};

/// GitHub webhooks are limited to 25 MB.
const MAX_WEBHOOK_SIZE: usize = 25 * 1024 * 1024;

/// Only the parts of the repository payload that the bot needs.
#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: String,
    owner: WebhookUser,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookLabel {
    name: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookHead {
    sha: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestInner {
    number: u64,
    state: String,
    head: WebhookHead,
    #[serde(default)]
    labels: Vec<WebhookLabel>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequest<'a> {
    action: &'a str,
    pull_request: WebhookPullRequestInner,
    label: Option<WebhookLabel>,
    repository: WebhookRepository,
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub CiflowEvent);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(
        request: Request,
        state: &ServerStateRef,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        // Parse webhook content
        match parse_webhook_event(parts, &body) {
            Ok(Some(event)) => Ok(GitHubWebhook(event)),
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(request: Parts, body: &[u8]) -> anyhow::Result<Option<CiflowEvent>> {
    let Some(event_type) = request.headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match event_type.as_bytes() {
        b"pull_request" => {
            let payload: WebhookPullRequest = serde_json::from_slice(body)?;
            Ok(parse_pull_request_event(payload)?.map(CiflowEvent::PullRequest))
        }
        b"installation_repositories" | b"installation" => Ok(Some(CiflowEvent::InstallationsChanged)),
        _ => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

fn parse_pull_request_event(
    payload: WebhookPullRequest,
) -> anyhow::Result<Option<PullRequestEvent>> {
    let changed_label = || {
        payload
            .label
            .as_ref()
            .map(|label| label.name.clone())
            .ok_or_else(|| anyhow::anyhow!("Label missing in {} event", payload.action))
    };
    let action = match payload.action {
        "labeled" => PullRequestAction::Labeled {
            label: changed_label()?,
        },
        "unlabeled" => PullRequestAction::Unlabeled {
            label: changed_label()?,
        },
        "synchronize" => PullRequestAction::Synchronized,
        "opened" => PullRequestAction::Opened,
        "reopened" => PullRequestAction::Reopened,
        "closed" => PullRequestAction::Closed,
        action => {
            tracing::debug!("Ignoring pull request action {action}");
            return Ok(None);
        }
    };

    let pr = payload.pull_request;
    let state = match pr.state.as_str() {
        "open" => PullRequestState::Open,
        "closed" => PullRequestState::Closed,
        state => return Err(anyhow::anyhow!("Unknown pull request state {state}")),
    };
    Ok(Some(PullRequestEvent {
        repository: GithubRepoName::new(&payload.repository.owner.login, &payload.repository.name),
        pull_request: PullRequest {
            number: pr.number.into(),
            head_sha: CommitSha(pr.head.sha),
            state,
            labels: pr.labels.into_iter().map(|label| label.name).collect(),
        },
        action,
    }))
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .strip_prefix(b"sha256=")
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}
