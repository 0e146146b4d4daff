//! Call event record.

use serde::Serialize;

use crate::capture::Normalized;

/// Flat field map describing one intercepted call.
///
/// Serializes as a plain JSON object. Field names written by the pipeline are exposed
/// as associated constants; extras use whatever keys the caller chose.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CallEvent(serde_json::Map<String, serde_json::Value>);

impl CallEvent {
    /// Qualified name of the receiver's class.
    pub const CLASS_NAME: &'static str = "class_name";
    /// Rendered signature of the intercepted method.
    pub const METHOD_NAME: &'static str = "method_name";
    /// Bare method name.
    pub const METHOD_SIMPLE_NAME: &'static str = "method_simple_name";
    /// Id of the calling thread.
    pub const THREAD_ID: &'static str = "thread_id";
    /// Display name of the calling thread.
    pub const THREAD_NAME: &'static str = "thread_name";
    /// Normalized argument list.
    pub const ARGS: &'static str = "args";
    /// Normalized return value.
    pub const RESULT: &'static str = "result";
    /// Normalized call stack.
    pub const STACK: &'static str = "stack";

    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an event pre-populated with `extras`.
    #[must_use]
    pub fn with_extras(extras: &serde_json::Map<String, serde_json::Value>) -> Self {
        CallEvent(extras.clone())
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Sets a normalized field. An absent value leaves the field out.
    pub fn insert_normalized(&mut self, key: &str, value: &Normalized) {
        if !value.is_absent() {
            self.insert(key, value.to_json());
        }
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the event has no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }
}
