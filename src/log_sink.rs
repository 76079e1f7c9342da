use log::{Level, LevelFilter};
use std::fmt;

// @module: Per-worker logging handle

/// Logging handle passed to each film worker.
///
/// Records are prefixed with the worker label and dropped above `max_level`,
/// so parallel workers can be quietened without touching the global logger.
#[derive(Debug, Clone)]
pub struct LogSink {
    // @field: Prefix for every record
    label: String,

    // @field: Most verbose level forwarded
    max_level: LevelFilter,
}

impl LogSink {
    pub fn new(label: impl Into<String>, max_level: LevelFilter) -> Self {
        Self {
            label: label.into(),
            max_level,
        }
    }

    /// Sink used by workers running alongside others: warnings and errors only
    pub fn quiet(label: impl Into<String>) -> Self {
        Self::new(label, LevelFilter::Warn)
    }

    /// Sink forwarding everything the global logger accepts
    pub fn verbose(label: impl Into<String>) -> Self {
        Self::new(label, LevelFilter::Trace)
    }

    /// Sink that forwards nothing
    pub fn silent() -> Self {
        Self::new("", LevelFilter::Off)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    pub fn log(&self, level: Level, args: fmt::Arguments) {
        if !self.enabled(level) {
            return;
        }
        if self.label.is_empty() {
            log::log!(level, "{}", args);
        } else {
            log::log!(level, "[{}] {}", self.label, args);
        }
    }

    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args);
    }
}
