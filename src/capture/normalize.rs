//! Best-effort conversion of runtime values to plain data.
//!
//! | Input | Normalized |
//! |-------|------------|
//! | `void` | [`Normalized::Absent`] |
//! | scalars, strings, `null` | unchanged |
//! | arrays | element-wise, recursively |
//! | classes | `"class <name>"` |
//! | other objects | textual rendering, or [`Normalized::Absent`] if rendering fails |
//!
//! Normalization is total: it never returns an error, whatever the runtime raises.

use std::fmt;

use crate::{
    describe::qualified_class_name,
    runtime::{ManagedRuntime, Value},
};

/// A runtime value reduced to plain data.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    /// No value: a `void` result, or an object whose rendering failed.
    Absent,
    /// Null reference.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String or rendered object.
    Str(String),
    /// Normalized array elements.
    List(Vec<Normalized>),
}

impl Normalized {
    /// Returns `true` for [`Normalized::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Normalized::Absent)
    }

    /// Converts to JSON. Absent values and non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Normalized::Absent | Normalized::Null => serde_json::Value::Null,
            Normalized::Bool(v) => serde_json::Value::Bool(*v),
            Normalized::Int(v) => serde_json::Value::from(*v),
            Normalized::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Normalized::Str(v) => serde_json::Value::String(v.clone()),
            Normalized::List(items) => {
                serde_json::Value::Array(items.iter().map(Normalized::to_json).collect())
            }
        }
    }
}

/// Plain text for scalars and strings, JSON text for lists, `undefined` when absent.
impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalized::Absent => f.write_str("undefined"),
            Normalized::Null => f.write_str("null"),
            Normalized::Bool(v) => write!(f, "{v}"),
            Normalized::Int(v) => write!(f, "{v}"),
            Normalized::Float(v) => write!(f, "{v}"),
            Normalized::Str(v) => f.write_str(v),
            Normalized::List(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Normalizes `value`, rendering objects through `runtime`.
pub fn normalize(value: &Value, runtime: &dyn ManagedRuntime) -> Normalized {
    match value {
        Value::Void => Normalized::Absent,
        Value::Null => Normalized::Null,
        Value::Bool(v) => Normalized::Bool(*v),
        Value::Int(v) => Normalized::Int(*v),
        Value::Float(v) => Normalized::Float(*v),
        Value::Str(v) => Normalized::Str(v.clone()),
        Value::Array(items) => normalize_all(items, runtime),
        Value::Class(class) => Normalized::Str(format!("class {}", qualified_class_name(class))),
        Value::Object(object) => runtime
            .render(object)
            .map_or(Normalized::Absent, Normalized::Str),
    }
}

/// Normalizes a sequence of values into a [`Normalized::List`].
pub fn normalize_all(values: &[Value], runtime: &dyn ManagedRuntime) -> Normalized {
    Normalized::List(values.iter().map(|v| normalize(v, runtime)).collect())
}
