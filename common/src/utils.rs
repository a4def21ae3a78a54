// common/src/utils.rs
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Setup tracing for consistent logging across the server and its tools.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
