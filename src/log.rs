//! Leveled logging over the event sink.
//!
//! [`Log`] filters records by [`LogLevel`], forwards the surviving ones to the
//! [`EventSink`] as `{"log": {"level", "tag", "message"}}` and mirrors each of them to
//! [`tracing`] so host-side subscribers see the same stream.
//!
//! Messages are arbitrary JSON values: plain strings for most entries, small objects
//! such as `{"stack": ...}` for structured ones.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::{
    sink::{EventSink, Message},
    Result,
};

/// Tag used for entries emitted by the engine itself.
pub const ENGINE_TAG: &str = "hookscope";

/// Severity of a log entry, ordered from most to least verbose.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug = 0,
    /// Normal operation.
    #[default]
    Info = 1,
    /// Something unexpected but recoverable.
    Warning = 2,
    /// A failed operation.
    Error = 3,
}

/// One log entry as sent to the sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Free-form source tag.
    pub tag: String,
    /// Message payload.
    pub message: serde_json::Value,
}

/// Leveled logger writing to an [`EventSink`].
///
/// The level can be changed concurrently with logging; it is read once per entry.
pub struct Log {
    level: AtomicU8,
    sink: Arc<dyn EventSink>,
}

impl Log {
    /// Creates a logger with the given threshold.
    pub fn new(sink: Arc<dyn EventSink>, level: LogLevel) -> Self {
        Log {
            level: AtomicU8::new(level as u8),
            sink,
        }
    }

    /// Returns the current threshold.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_repr(self.level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Changes the threshold and records the change at debug level.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
        self.debug(ENGINE_TAG, format!("Set log level: {level}"));
    }

    /// Returns `true` if entries at `level` pass the threshold.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Emits one entry if `level` passes the threshold.
    pub fn log(&self, level: LogLevel, tag: &str, message: impl Into<serde_json::Value>) {
        if !self.is_enabled(level) {
            return;
        }

        let message = message.into();
        mirror(level, tag, &message);
        self.sink.send(Message::Log(LogRecord {
            level,
            tag: tag.to_string(),
            message,
        }));
    }

    /// Emits a debug entry.
    pub fn debug(&self, tag: &str, message: impl Into<serde_json::Value>) {
        self.log(LogLevel::Debug, tag, message);
    }

    /// Emits an info entry.
    pub fn info(&self, tag: &str, message: impl Into<serde_json::Value>) {
        self.log(LogLevel::Info, tag, message);
    }

    /// Emits a warning entry.
    pub fn warning(&self, tag: &str, message: impl Into<serde_json::Value>) {
        self.log(LogLevel::Warning, tag, message);
    }

    /// Emits an error entry.
    pub fn error(&self, tag: &str, message: impl Into<serde_json::Value>) {
        self.log(LogLevel::Error, tag, message);
    }

    /// Runs `f`, returning `default` and logging the error at debug level if it fails.
    pub fn ignore_error<T>(&self, f: impl FnOnce() -> Result<T>, default: T) -> T {
        match f() {
            Ok(value) => value,
            Err(error) => {
                self.debug(ENGINE_TAG, format!("Catch ignored error. {error}"));
                default
            }
        }
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log").field("level", &self.level()).finish()
    }
}

fn mirror(level: LogLevel, tag: &str, message: &serde_json::Value) {
    match level {
        LogLevel::Debug => tracing::debug!(tag, %message),
        LogLevel::Info => tracing::info!(tag, %message),
        LogLevel::Warning => tracing::warn!(tag, %message),
        LogLevel::Error => tracing::error!(tag, %message),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::from_str("verbose").is_err());
    }

    #[test]
    fn test_threshold_filters() {
        let sink = Arc::new(MemorySink::new());
        let log = Log::new(sink.clone(), LogLevel::Info);

        log.debug("t", "dropped");
        log.info("t", "kept");
        log.error("t", serde_json::json!({"stack": "x"}));

        let logs = sink.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "kept");
        assert_eq!(logs[1].level, LogLevel::Error);
    }

    #[test]
    fn test_set_level_records_change() {
        let sink = Arc::new(MemorySink::new());
        let log = Log::new(sink.clone(), LogLevel::Info);

        log.set_level(LogLevel::Debug);
        assert_eq!(log.level(), LogLevel::Debug);
        assert_eq!(sink.logs()[0].message, "Set log level: debug");
    }

    #[test]
    fn test_ignore_error() {
        let sink = Arc::new(MemorySink::new());
        let log = Log::new(sink.clone(), LogLevel::Debug);

        let value = log.ignore_error(|| Err(runtime_error!("boom")), 7);
        assert_eq!(value, 7);
        let message = sink.logs()[0].message.as_str().unwrap().to_string();
        assert!(message.starts_with("Catch ignored error."));
        assert!(message.contains("boom"));

        assert_eq!(log.ignore_error(|| Ok(1), 7), 1);
    }
}
