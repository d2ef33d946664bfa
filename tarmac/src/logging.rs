//! Run logging.
//!
//! Every run writes the same structured events twice: a plain file
//! (default `logs/tarmac.log`) for post-run inspection, and a colored
//! stdout feed for live tailing. Lines are stamped with elapsed run time
//! rather than wall-clock time, so the log lines up with the
//! simulation's own thresholds. `RUST_LOG` narrows or widens the filter;
//! the default level is `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background file writer alive.
///
/// Dropping the guard flushes buffered lines and closes the log file, so
/// it belongs with the run, not the call site that set logging up.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Creates the log directory and truncates the previous run's file.
///
/// The file holds the current run only; whatever an earlier run left
/// behind is cleared before the first line is written.
fn prepare_log_file(log_dir: &str, log_file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = Path::new(log_dir).join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Installs the global subscriber with the file and stdout layers.
///
/// Fails if the log directory cannot be created or the previous file
/// cannot be truncated. The returned guard must outlive the run; file
/// output stops once it drops.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_timer(uptime()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stdout)
                .with_ansi(true)
                .with_timer(uptime()),
        )
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Directory the run log lands in, relative to the working directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// File name of the run log.
pub fn default_log_file() -> &'static str {
    "tarmac.log"
}
