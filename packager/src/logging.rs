//! Stderr backend for the `log` facade.
//!
//! Library code reports per-path and per-command detail through `log::debug!`
//! and `log::trace!`. The binary installs [`StderrLogger`] once at start-up
//! with a level derived from `-v` and `-q`.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Writes log records to stderr as `[level] message`.
#[derive(Debug, Clone, Copy)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    /// Create a logger that emits records up to `level`.
    #[must_use]
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        if writeln!(
            stderr,
            "[{}] {}",
            record.level().as_str().to_ascii_lowercase(),
            record.args()
        )
        .is_err()
        {
            // Best-effort logging; ignore write failures.
        }
    }

    fn flush(&self) {
        if std::io::stderr().flush().is_err() {
            // Nothing useful to do if stderr is gone.
        }
    }
}

/// Maps the CLI verbosity flags to a level filter.
///
/// Quiet mode keeps errors only; otherwise warnings are shown by default and
/// each `-v` adds a level.
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs [`StderrLogger`] as the global logger.
///
/// # Errors
///
/// Returns an error if a global logger has already been installed.
pub fn init(verbosity: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let level = level_for(verbosity, quiet);
    log::set_boxed_logger(Box::new(StderrLogger::new(level)))
        .map(|()| log::set_max_level(level))
}
