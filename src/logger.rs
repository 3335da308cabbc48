// src/logger.rs

//! Console logger for simulation runs.
//!
//! Implements the [`log`] crate's facade and writes each record to standard
//! error, stamped with the time since the logger was installed. The library
//! only emits records through the `log` macros; installing this logger is up
//! to the host program, which may use any other `log` backend instead.
//!
//! Example output:
//! ```text
//! INFO [2s 15ms] bar_stabilization_sim::simulation - simulation loop started at 0ns
//! DEBUG [8s 10ms] bar_stabilization_sim::disturbance - impulse disturbance of 200.0 deg/s at 8.01s
//! ```

use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use humantime::format_duration;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Writes log records to standard error with an uptime stamp.
pub struct ConsoleLogger {
    start: Instant,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    fn uptime(&self) -> Duration {
        // Whole milliseconds keep the stamp short.
        Duration::from_millis(self.start.elapsed().as_millis() as u64)
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!(
                "{} [{}] {} - {}\n",
                record.level(),
                format_duration(self.uptime()),
                record.target(),
                record.args()
            );
            let _ = std::io::stderr().lock().write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Installs the console logger.
///
/// Records below `level` are discarded.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(ConsoleLogger::new);
    log::set_logger(logger).map(|()| log::set_max_level(level))
}
