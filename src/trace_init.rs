//! JSON trace output for diagnosing searches, compiled in with the `trace`
//! feature. Without it `init_tracing` is a no-op and the `tracing` macros
//! are compiled out.

use std::io;
use std::path::Path;

/// Keeps the background log writer alive. Buffered lines are flushed when
/// it is dropped, so hold it until the process is done searching.
#[must_use]
pub struct TraceGuard {
    #[cfg(feature = "trace")]
    _writer: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Log spans and events as JSON lines to `<log_dir>/phonosearch-trace.jsonl`.
///
/// The filter comes from `PHONOSEARCH_LOG` (EnvFilter syntax) and defaults
/// to `phonosearch=debug`. Only the first call installs a subscriber.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> io::Result<TraceGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "phonosearch-trace.jsonl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("PHONOSEARCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("phonosearch=debug"));
    let installed = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    Ok(TraceGuard {
        _writer: installed.then_some(guard),
    })
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> io::Result<TraceGuard> {
    Ok(TraceGuard {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let _first = init_tracing(&logs).unwrap();
        let _second = init_tracing(&logs).unwrap();
        #[cfg(feature = "trace")]
        assert!(logs.is_dir());
    }
}
