//! Outgoing record channel.
//!
//! Everything the engine reports, log entries and captured call events alike, leaves
//! the process through an [`EventSink`]. Each record is one [`Message`], serialized as
//! either `{"log": {...}}` or `{"event": {...}}`. Sending is fire-and-forget: sinks do
//! not acknowledge records and never report failures back to the sender.
//!
//! # Provided Sinks
//!
//! | Sink | Behavior |
//! |------|----------|
//! | [`MemorySink`] | Keeps every message in an append-only in-memory list |
//! | [`WriterSink`] | Writes newline-delimited JSON to any [`std::io::Write`] |

use std::{io::Write, sync::Mutex};

use serde::Serialize;

use crate::{capture::CallEvent, log::LogRecord};

/// One outgoing record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Message {
    /// A leveled log entry.
    Log(LogRecord),
    /// A captured call.
    Event(CallEvent),
}

impl Message {
    /// Serializes the message to its JSON wire form.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Receiver of outgoing records.
///
/// `send` is called synchronously from within intercepted calls, from any thread.
pub trait EventSink: Send + Sync {
    /// Delivers one record. Must not block on a response.
    fn send(&self, message: Message);
}

/// Sink collecting every message in memory.
///
/// Backed by an append-only [`boxcar::Vec`], so concurrent senders never block each
/// other and readers can snapshot at any time.
#[derive(Default)]
pub struct MemorySink {
    messages: boxcar::Vec<Message>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all messages in arrival order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().map(|(_, m)| m.clone()).collect()
    }

    /// Returns a snapshot of the captured call events.
    #[must_use]
    pub fn events(&self) -> Vec<CallEvent> {
        self.messages
            .iter()
            .filter_map(|(_, m)| match m {
                Message::Event(event) => Some(event.clone()),
                Message::Log(_) => None,
            })
            .collect()
    }

    /// Returns a snapshot of the log records.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.messages
            .iter()
            .filter_map(|(_, m)| match m {
                Message::Log(record) => Some(record.clone()),
                Message::Event(_) => None,
            })
            .collect()
    }

    /// Returns the number of messages received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.count()
    }

    /// Returns `true` if nothing was received yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl EventSink for MemorySink {
    fn send(&self, message: Message) {
        self.messages.push(message);
    }
}

/// Sink writing one JSON document per line.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn send(&self, message: Message) {
        let line = match serde_json::to_vec(&message) {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(%error, "failed to serialize message");
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = writer
            .write_all(&line)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush())
        {
            tracing::warn!(%error, "failed to write message");
        }
    }
}
