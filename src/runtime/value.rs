//! Runtime value representation exchanged with intercepted methods.

use std::{fmt, sync::Arc};

use crate::runtime::ClassHandle;

/// Reference to an object living in the host runtime's heap.
///
/// The handle is opaque to this crate; only the runtime can render or inspect the
/// object behind it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    handle: u64,
    class_name: Arc<str>,
}

impl ObjectRef {
    /// Creates an object reference.
    #[must_use]
    pub fn new(handle: u64, class_name: impl Into<Arc<str>>) -> Self {
        Self {
            handle,
            class_name: class_name.into(),
        }
    }

    /// Returns the runtime handle.
    #[must_use]
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Returns the name of the object's runtime class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// Value passed to or returned from a managed method.
///
/// # Runtime Type Mapping
///
/// | Runtime Type | Value Variant |
/// |--------------|---------------|
/// | `void` return | [`Value::Void`] |
/// | `null` | [`Value::Null`] |
/// | `boolean` | [`Value::Bool`] |
/// | `byte`, `short`, `int`, `long`, `char` code | [`Value::Int`] |
/// | `float`, `double` | [`Value::Float`] |
/// | `java.lang.String` | [`Value::Str`] |
/// | Arrays | [`Value::Array`] (materialized element-wise) |
/// | Any other object | [`Value::Object`] |
/// | Receiver of a static method | [`Value::Class`] |
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No value (void return).
    Void,
    /// Null reference.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integral value, widened to 64 bits.
    Int(i64),
    /// Floating point value, widened to 64 bits.
    Float(f64),
    /// String value.
    Str(String),
    /// Runtime-native array, element-wise.
    Array(Vec<Value>),
    /// Reference to an opaque runtime object.
    Object(ObjectRef),
    /// A class used as receiver, e.g. for static methods.
    Class(ClassHandle),
}

impl Value {
    /// Returns `true` for composite values (arrays, objects and classes).
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Class(_))
    }

    /// Returns `true` for [`Value::Void`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Returns the integral value, if any.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean value, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the runtime class name of a receiver value.
    ///
    /// Objects report their runtime class, class receivers their own name.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Value::Object(obj) => Some(obj.class_name()),
            Value::Class(class) => Some(class.wrapper_name().unwrap_or(class.name())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Array(items) => write!(f, "array[{}]", items.len()),
            Value::Object(obj) => write!(f, "{}@{:x}", obj.class_name(), obj.handle()),
            Value::Class(class) => write!(f, "class {}", class.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<ClassHandle> for Value {
    fn from(value: ClassHandle) -> Self {
        Value::Class(value)
    }
}
