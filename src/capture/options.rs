//! Capture configuration.

use bitflags::bitflags;

use crate::{Error, Result};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Fields a capturing replacement records per call.
    pub struct CaptureFields: u8 {
        /// Class name, rendered signature and bare method name.
        const METHOD = 0x01;
        /// Thread id and thread name.
        const THREAD = 0x02;
        /// Call stack snapshot.
        const STACK = 0x04;
        /// Normalized arguments and result.
        const ARGS = 0x08;
    }
}

impl Default for CaptureFields {
    fn default() -> Self {
        CaptureFields::METHOD
    }
}

/// Recognized option keys and the flag each one controls.
const RECOGNIZED: [(&str, CaptureFields); 4] = [
    ("method", CaptureFields::METHOD),
    ("thread", CaptureFields::THREAD),
    ("stack", CaptureFields::STACK),
    ("args", CaptureFields::ARGS),
];

/// Configuration of the event capture pipeline.
///
/// A fixed set of recognized flags plus an open map of extra fields that are copied
/// verbatim into every emitted event. The default records the method identity only.
///
/// # Examples
///
/// ```rust,no_run
/// use hookscope::CaptureOptions;
/// use serde_json::json;
///
/// let typed = CaptureOptions::default()
///     .with_thread(true)
///     .with_args(true)
///     .with_extra("tag", json!("login"));
///
/// let parsed = CaptureOptions::from_json(&json!({"thread": true, "args": true, "tag": "login"}))?;
/// assert_eq!(typed, parsed);
/// # Ok::<(), hookscope::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureOptions {
    fields: CaptureFields,
    extras: serde_json::Map<String, serde_json::Value>,
}

impl CaptureOptions {
    /// Creates options recording exactly `fields`, without extras.
    #[must_use]
    pub fn new(fields: CaptureFields) -> Self {
        CaptureOptions {
            fields,
            extras: serde_json::Map::new(),
        }
    }

    /// Builds options from a JSON object.
    ///
    /// The keys `method`, `thread`, `stack` and `args` set the corresponding flag and
    /// must be booleans. Flags not mentioned keep their default. Every other key is
    /// kept as an extra field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCaptureOption`] if `value` is not an object or if a
    /// recognized key holds a non-boolean value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(Error::InvalidCaptureOption {
                key: String::new(),
                reason: format!("expected an object, got {value}"),
            });
        };

        let mut options = CaptureOptions::default();
        for (key, value) in object {
            match RECOGNIZED.iter().find(|(name, _)| *name == key.as_str()) {
                Some((_, flag)) => {
                    let enabled = value.as_bool().ok_or_else(|| Error::InvalidCaptureOption {
                        key: key.clone(),
                        reason: format!("expected a boolean, got {value}"),
                    })?;
                    options.fields.set(*flag, enabled);
                }
                None => {
                    options.extras.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(options)
    }

    /// Returns the recorded fields.
    #[must_use]
    pub fn fields(&self) -> CaptureFields {
        self.fields
    }

    /// Returns the extra fields.
    #[must_use]
    pub fn extras(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extras
    }

    /// Returns `true` if `field` is recorded.
    #[must_use]
    pub fn captures(&self, field: CaptureFields) -> bool {
        self.fields.contains(field)
    }

    /// Toggles the method identity fields.
    #[must_use]
    pub fn with_method(mut self, enabled: bool) -> Self {
        self.fields.set(CaptureFields::METHOD, enabled);
        self
    }

    /// Toggles the thread identity fields.
    #[must_use]
    pub fn with_thread(mut self, enabled: bool) -> Self {
        self.fields.set(CaptureFields::THREAD, enabled);
        self
    }

    /// Toggles the call stack field.
    #[must_use]
    pub fn with_stack(mut self, enabled: bool) -> Self {
        self.fields.set(CaptureFields::STACK, enabled);
        self
    }

    /// Toggles the arguments and result fields.
    #[must_use]
    pub fn with_args(mut self, enabled: bool) -> Self {
        self.fields.set(CaptureFields::ARGS, enabled);
        self
    }

    /// Adds an extra field copied into every event.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}
