use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, fmt::time::LocalTime, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";

const DEFAULT_FILTER: &str = "click_segmentation=debug,warn";

/// Logs to stderr and to a daily file under [`LOG_DIR`] (JSON lines).
///
/// `RUST_LOG` overrides the default filter. Keep the returned guard alive
/// for the lifetime of the program or buffered file output is lost.
pub fn init_logs() -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "click_segmentation.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_timer(LocalTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return None;
    }

    /// eframe, winit and reqwest log through `log`
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::warn!("Failed to forward log records: {}", e);
    }

    Some(guard)
}
