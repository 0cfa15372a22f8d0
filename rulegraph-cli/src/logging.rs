//! Logging initialization: logs go only to a file (or are dropped), never to
//! the console, so stdout stays clean for the conversation.
//!
//! Reads `RUST_LOG` (filter) and `LOG_FILE` (path) from env (e.g. via .env).
//! When `LOG_FILE` is set, logs are appended there; otherwise they are
//! dropped.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes tracing so that logs are never printed to the console.
///
/// - **RUST_LOG**: filter, e.g. `info`, `rulegraph=debug`. Default: `info`.
/// - **LOG_FILE**: when set, logs are appended to this file (plain text).
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).init();
        tracing::info!(path = %path, "rulegraph logging to file");
    } else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).init();
    }
    Ok(())
}
