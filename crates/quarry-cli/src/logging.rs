//! Logging setup for the `quarry` binary
//!
//! Console output goes to stderr so result tables and JSON on stdout stay
//! clean. `RUST_LOG` takes precedence over the configured filter.

use quarry_core::LoggingSettings;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quarry")
        .join("logs")
}

fn filter(settings: &LoggingSettings, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&settings.filter)
        }
    })
}

/// Install the global subscriber. The returned guard flushes the JSON file
/// writer and must live until exit.
pub fn init(settings: &LoggingSettings, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(filter(settings, verbose))
        .boxed();

    let mut layers = vec![console];
    let mut guard = None;

    if settings.json_file {
        let dir = log_dir();
        std::fs::create_dir_all(&dir)?;
        let (writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "quarry.log"));
        layers.push(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer)
                .with_filter(filter(settings, verbose))
                .boxed(),
        );
        guard = Some(file_guard);
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    tracing::debug!(json_file = settings.json_file, "logging initialized");
    Ok(guard)
}
