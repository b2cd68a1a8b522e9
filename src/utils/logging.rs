use anyhow::Error;
use tracing::span::Span;
use tracing_subscriber::EnvFilter;

pub trait LogError {
    /// Logs the error together with its whole chain of causes inside this span.
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Error: {error:?}");
        });
    }
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, `info` by default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
