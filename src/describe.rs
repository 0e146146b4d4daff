//! Derived descriptive metadata for method handles.
//!
//! Enrichment attaches two read-only fields to a [`MethodHandle`]: the qualified name of
//! the declaring class and a rendered signature of the form
//! `ReturnType ClassName.methodName(ArgType1, ArgType2)`. Both are computed once, on
//! first read, and cached inside the handle; every clone of the handle shares them.
//!
//! Enrichment never changes how the method is invoked and cannot fail.
//!
//! # Examples
//!
//! ```rust,ignore
//! let method = describe::enrich(&method);
//! assert_eq!(method.signature(), "java.lang.String com.example.Greeter.greet(java.lang.String)");
//! assert_eq!(method.to_string(), method.signature());
//! ```

use std::fmt;

use crate::runtime::{ClassHandle, MethodHandle, TypeDescriptor};

/// Placeholder for return types the runtime cannot describe.
pub const UNKNOWN_TYPE: &str = "<unknown>";

/// Descriptive fields derived from a method handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescription {
    /// Qualified name of the declaring class.
    pub class_name: String,
    /// Rendered signature, `ReturnType ClassName.methodName(ArgTypes)`.
    pub signature: String,
}

impl MethodDescription {
    fn of(method: &MethodHandle) -> Self {
        let class_name = qualified_class_name(method.declaring_class()).to_string();
        let return_type = method
            .return_type()
            .map_or(UNKNOWN_TYPE, TypeDescriptor::as_str);
        let params = method
            .params()
            .iter()
            .map(TypeDescriptor::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let signature = format!("{return_type} {class_name}.{}({params})", method.name());

        MethodDescription {
            class_name,
            signature,
        }
    }
}

/// Returns the name cached by the class wrapper, or the class' own name when absent.
#[must_use]
pub fn qualified_class_name(class: &ClassHandle) -> &str {
    class.wrapper_name().unwrap_or(class.name())
}

/// Enriches `method` in place and returns it.
///
/// Idempotent: enriching an already enriched handle returns the cached description.
pub fn enrich(method: &MethodHandle) -> &MethodHandle {
    method.description();
    method
}

impl MethodHandle {
    /// Returns the derived description, computing it on first access.
    #[must_use]
    pub fn description(&self) -> &MethodDescription {
        self.0
            .description
            .get_or_init(|| MethodDescription::of(self))
    }

    /// Returns the qualified name of the declaring class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.description().class_name
    }

    /// Returns the rendered signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.description().signature
    }

    /// Returns `true` once the description has been computed.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.0.description.get().is_some()
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}
