//! File-based logging
//!
//! The TUI owns the terminal, so tracing output goes to a file instead of
//! stdout.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "melodffy";
const DEFAULT_FILTER: &str = "melodffy=debug,librespot=info,rspotify=info,warn";

/// Install the global subscriber writing to `.logs/melodffy.YYYY-MM-DD.log`.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. The returned guard flushes the
/// background writer when dropped, so keep it alive until exit.
pub fn init_logging() -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(LOG_DIR)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(LOG_DIR, LOG_FILE_PREFIX));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()?;

    tracing::info!(dir = LOG_DIR, "Logging initialized");
    Ok(guard)
}

/// Log the outcome of a Spotify API request
#[macro_export]
macro_rules! log_api_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::info!(operation = $operation, "API request successful"),
            Err(e) => tracing::error!(operation = $operation, error = %e, "API request failed"),
        }
    };
}
