// Console Logger
//
// Writes log lines to stderr so stdout stays free for emitted code.

use super::logger::{LogLevel, Logger};

#[derive(Debug)]
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// `Debug` when verbose, `Info` otherwise.
    pub fn for_verbosity(verbose: bool) -> Self {
        Self::new(if verbose { LogLevel::Debug } else { LogLevel::Info })
    }

    fn write(&self, level: LogLevel, msg: &str) {
        if self.is_enabled(level) {
            eprintln!("[{}] {}", level.tag(), msg);
        }
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        self.write(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.write(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.write(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.write(LogLevel::Error, msg);
    }
}
