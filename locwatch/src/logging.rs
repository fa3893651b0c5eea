//! Logging setup.
//!
//! Installs a global `tracing` subscriber with:
//! - a file layer writing `<dir>/<file>` through a non-blocking writer
//!   (the file is truncated at start so each run has its own log)
//! - an optional compact stdout layer for interactive runs
//! - an `EnvFilter` defaulting to `info`, overridable with `RUST_LOG`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the file writer alive. Dropping it flushes and closes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// The log file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create `dir` if needed and truncate `dir/file`.
pub fn prepare_log_file(dir: &Path, file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Install the global subscriber.
///
/// Fails if the log file cannot be prepared or a global subscriber is already
/// installed.
pub fn init_logging(dir: &Path, file: &str, stdout: bool) -> io::Result<LoggingGuard> {
    let path = prepare_log_file(dir, file)?;

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_target(true);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_timer(timer)
            .with_target(false)
            .compact()
            .boxed()
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}
