use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use ciflow_tagger::ciflow::labels::LabelPolicy;
use ciflow_tagger::ciflow::{CiflowContext, CiflowState};
use ciflow_tagger::config::PolicyConfig;
use ciflow_tagger::github::api::client::GithubRepositoryClient;
use ciflow_tagger::github::server::{create_app, create_ciflow_process, ServerState};
use ciflow_tagger::github::{GithubAppState, WebhookSecret};
use ciflow_tagger::utils::logging::init_logging;

#[derive(clap::Parser)]
struct Opts {
    /// Secret used to authenticate webhooks.
    #[arg(long, env = "WEBHOOK_SECRET")]
    webhook_secret: String,

    /// Github App ID.
    #[arg(long, env = "APP_ID")]
    app_id: u64,

    /// Private key used to authenticate as a Github App.
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Path to a TOML file with the label policy. The built-in policy is used if not set.
    #[arg(long, env = "POLICY_FILE")]
    policy: Option<PathBuf>,

    /// Address on which the webhook server listens.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

async fn server(state: ServerState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let policy = match &opts.policy {
        Some(path) => PolicyConfig::load(path)?,
        None => PolicyConfig::builtin()?,
    };
    tracing::info!("Loaded label policy: {policy:#?}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let app_state = runtime.block_on(GithubAppState::load(
        opts.app_id.into(),
        opts.private_key.into_bytes().into(),
    ))?;
    let app_state: Arc<dyn CiflowState<GithubRepositoryClient>> = Arc::new(app_state);

    let ctx = CiflowContext::new(LabelPolicy::new(policy));
    let (tx, ciflow_process) = create_ciflow_process(app_state, ctx);

    let state = ServerState::new(tx, WebhookSecret::new(opts.webhook_secret));
    let server_process = server(state, opts.bind);

    runtime.block_on(async move {
        tokio::select! {
            () = ciflow_process => {
                tracing::warn!("Webhook event process has ended");
                Ok(())
            },
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })?;

    Ok(())
}

fn main() {
    init_logging();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
