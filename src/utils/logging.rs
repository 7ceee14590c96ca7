use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "price-watcher.log";

fn default_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose {
        "price_watcher=debug,info"
    } else {
        "price_watcher=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Install the global tracing subscriber.
///
/// Console output is always enabled. When `log_dir` is set, records are also
/// written to a daily rolling file in that directory; the returned guard must
/// be held until shutdown so buffered lines get flushed.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);

            tracing_subscriber::registry()
                .with(default_filter(verbose))
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(default_filter(verbose))
                .with(console)
                .init();
            None
        }
    }
}
