//! Bootstrap utilities for the driver binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the WHOLESALE_LOG environment variable.
///
/// Defaults to "info" level if WHOLESALE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Config file path from `--config <path>` or the first positional argument.
pub fn parse_config_path() -> Option<String> {
    config_path_from(std::env::args().skip(1))
}

fn config_path_from(mut args: impl Iterator<Item = String>) -> Option<String> {
    let first = args.next()?;
    if first == "--config" || first == "-c" {
        args.next()
    } else if let Some(path) = first.strip_prefix("--config=") {
        Some(path.to_string())
    } else {
        Some(first)
    }
}
