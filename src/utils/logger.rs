use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static SUBSCRIBER_READY: OnceCell<()> = OnceCell::new();
static FILE_WRITER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> =
    OnceCell::new();

pub const DEFAULT_LOG_DIRECTIVES: &str =
    "info,analytics::snapshot=info,analytics::normalize=warn,analytics::date=warn";

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Used when `RUST_LOG` is unset.
    pub directives: String,
    pub file_prefix: String,
    pub stderr: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            directives: DEFAULT_LOG_DIRECTIVES.to_string(),
            file_prefix: "worklog-analytics.log".to_string(),
            stderr: true,
        }
    }
}

/// Installs the global subscriber with [`LogOptions::default`].
pub fn init_logging(log_dir: &Path) -> AppResult<()> {
    init_logging_with(log_dir, &LogOptions::default())
}

/// Daily rolling file under `log_dir`, optionally mirrored to stderr. Only
/// the first successful call in a process has any effect.
pub fn init_logging_with(log_dir: &Path, options: &LogOptions) -> AppResult<()> {
    SUBSCRIBER_READY
        .get_or_try_init(|| {
            std::fs::create_dir_all(log_dir)?;
            let env_filter = build_filter(&options.directives)?;

            let (file_writer, guard) = tracing_appender::non_blocking(
                tracing_appender::rolling::daily(log_dir, &options.file_prefix),
            );
            FILE_WRITER_GUARD
                .set(guard)
                .map_err(|_| AppError::other("log writer already installed"))?;

            let stderr_layer = options.stderr.then(|| {
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339())
            });

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .with(stderr_layer)
                .try_init()
                .map_err(|err| AppError::other(format!("cannot install log subscriber: {err}")))
        })
        .map(|_| ())
}

/// `RUST_LOG` wins over `fallback` when it is set and parses.
pub fn build_filter(fallback: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|err| AppError::config(format!("invalid log directives {fallback:?}: {err}")))
}
