use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber: compact events on stderr, plus JSON events
/// in a daily-rolling file under `log_dir`. An empty `log_dir` disables the
/// file.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the process.
pub fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = if logging.log_dir.is_empty() {
        (None, None)
    } else {
        std::fs::create_dir_all(&logging.log_dir)
            .with_context(|| format!("failed to create log directory {}", logging.log_dir))?;
        let appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .boxed();
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(build_filter(&logging.default_filter)?)
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(guard)
}

/// `RUST_LOG` when set and valid, else the configured default directives.
fn build_filter(default_directives: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directives)
        .with_context(|| format!("invalid log filter '{default_directives}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_directives_used_without_rust_log() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("lyf_engine=debug,warn").unwrap();
        assert!(filter.to_string().contains("lyf_engine=debug"));
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        std::env::set_var("RUST_LOG", "lyf_engine=trace");
        let filter = build_filter("warn").unwrap();
        std::env::remove_var("RUST_LOG");
        assert!(filter.to_string().contains("lyf_engine=trace"));
    }

    #[test]
    #[serial]
    fn test_malformed_default_rejected() {
        std::env::remove_var("RUST_LOG");
        assert!(build_filter("lyf_engine=notalevel").is_err());
    }
}
