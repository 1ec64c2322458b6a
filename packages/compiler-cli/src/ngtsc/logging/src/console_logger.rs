// Console Logger
//
// Logger that forwards to `tracing`, so output goes wherever the embedding
// application installed its subscriber.

use super::logger::{LogLevel, Logger};

/// Console logger.
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        if self.is_enabled(LogLevel::Debug) {
            tracing::debug!(target: "ngtsc", "{}", msg);
        }
    }

    fn info(&self, msg: &str) {
        if self.is_enabled(LogLevel::Info) {
            tracing::info!(target: "ngtsc", "{}", msg);
        }
    }

    fn warn(&self, msg: &str) {
        if self.is_enabled(LogLevel::Warn) {
            tracing::warn!(target: "ngtsc", "{}", msg);
        }
    }

    fn error(&self, msg: &str) {
        if self.is_enabled(LogLevel::Error) {
            tracing::error!(target: "ngtsc", "{}", msg);
        }
    }
}
