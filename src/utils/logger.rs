use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str =
    "info,app::ledger=debug,app::reconcile=debug,app::store=info";

/// One-shot tracing bootstrap. With a log directory, events also go to a
/// daily-rolling file; calling it again is a no-op.
pub fn init_logging(log_dir: Option<&Path>) -> AppResult<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
                .map_err(|err| AppError::config(format!("invalid log filter: {err}")))?;

            match log_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;

                    let file_appender = tracing_appender::rolling::daily(dir, "pizza-points.log");
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    LOGGER_GUARD
                        .set(guard)
                        .map_err(|_| AppError::config("logger already initialized"))?;

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(
                            fmt::layer()
                                .with_writer(non_blocking)
                                .with_ansi(false)
                                .with_target(true)
                                .with_timer(UtcTime::rfc_3339()),
                        )
                        .with(
                            fmt::layer()
                                .with_target(false)
                                .with_timer(UtcTime::rfc_3339()),
                        )
                        .init();
                }
                None => {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(
                            fmt::layer()
                                .with_target(true)
                                .with_timer(UtcTime::rfc_3339()),
                        )
                        .init();
                }
            }

            Ok(())
        })
        .map(|_| ())
}
