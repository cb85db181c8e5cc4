use std::path::PathBuf;
use std::time::Duration;

use mdrkit_infra::ApiError;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default
/// `info`).
///
/// Returns `false` if a subscriber was already installed; calling it twice
/// is harmless.
pub fn init_tracing() -> bool {
    install(env_filter())
}

/// Load `.env` from the working directory, then install the subscriber so a
/// `RUST_LOG` set in the file applies.
pub fn init_tracing_with_dotenv() -> bool {
    let (filter, loaded) = filter_after(dotenvy::dotenv);
    let installed = install(filter);
    match loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env file loaded"),
    }
    installed
}

fn filter_after(
    load_env: impl FnOnce() -> dotenvy::Result<PathBuf>,
) -> (EnvFilter, dotenvy::Result<PathBuf>) {
    let loaded = load_env();
    (env_filter(), loaded)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

/// Log the outcome of a maintenance operation with structured fields.
///
/// `operation` should be a stable identifier (e.g. `"cleanup-sessions"`)
/// without sensitive data.
#[inline]
pub fn log_operation(operation: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(operation, duration_ms, "operation_success");
    } else {
        warn!(operation, duration_ms, "operation_failure");
    }
}

/// Convert an `ApiError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ApiError) -> &'static str {
    match error {
        ApiError::Auth(_) => "auth",
        ApiError::Api { .. } => "api",
        ApiError::Validation(_) => "validation",
        ApiError::NotFound(_) => "not_found",
        ApiError::Network(_) => "network",
        ApiError::Timeout(_) => "timeout",
        ApiError::Config(_) => "config",
        ApiError::Client(_) => "client",
        ApiError::RetriesExhausted { .. } => "retries_exhausted",
    }
}
