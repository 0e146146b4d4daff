//! Handles to classes, loading contexts and method overloads of the host runtime.
//!
//! All handles are cheap to clone (`Arc` backed) and hold non-owning references to
//! definitions owned by the runtime's class registry. They stay valid for the process
//! lifetime of the class definition they describe.
//!
//! # Key Types
//! - [`LoaderRef`] - A loading context (class loader)
//! - [`ClassHandle`] - A resolved class, optionally pinned to a loader
//! - [`TypeDescriptor`] - Textual type descriptor such as `int` or `java.lang.String`
//! - [`MemberInfo`] - Raw overload description as reported by the runtime
//! - [`MethodHandle`] - One concrete overload, with its stable [`MethodKey`]
//! - [`MethodOverloadSet`] - All overloads sharing a class and a name
//! - [`ThreadInfo`], [`StackFrame`] - Call-site introspection records

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use crate::{
    describe::MethodDescription,
    runtime::{CONSTRUCTOR_NAME, NATIVE_CONSTRUCTOR_NAME},
};

/// Reference to a loading context of the host runtime.
///
/// Two references are equal when they carry the same runtime identifier; the name is
/// only used for display and error reporting.
#[derive(Clone, Debug)]
pub struct LoaderRef {
    id: u64,
    name: Arc<str>,
}

impl LoaderRef {
    /// Creates a loader reference from its runtime identifier and display name.
    #[must_use]
    pub fn new(id: u64, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the runtime identifier of this loader.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the display name of this loader.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for LoaderRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LoaderRef {}

impl Hash for LoaderRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for LoaderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

struct ClassInfo {
    name: String,
    wrapper_name: Option<String>,
    loader: Option<LoaderRef>,
}

/// Reference to a class resolved in the host runtime.
///
/// `loader` is `None` when the class was resolved without pinning a loading context
/// (or lives in the boot context). `wrapper_name` is the name cached by the runtime's
/// class wrapper; it may be absent for classes the runtime only partially describes.
#[derive(Clone)]
pub struct ClassHandle(Arc<ClassInfo>);

impl ClassHandle {
    /// Creates a class handle.
    ///
    /// # Arguments
    ///
    /// * `name` - Fully qualified class name
    /// * `loader` - The owning loading context, if pinned
    /// * `wrapper_name` - Name cached by the runtime's class wrapper, if any
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        loader: Option<LoaderRef>,
        wrapper_name: Option<String>,
    ) -> Self {
        Self(Arc::new(ClassInfo {
            name: name.into(),
            wrapper_name,
            loader,
        }))
    }

    /// Returns the class' own fully qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the name cached by the runtime's class wrapper.
    #[must_use]
    pub fn wrapper_name(&self) -> Option<&str> {
        self.0.wrapper_name.as_deref()
    }

    /// Returns the owning loading context.
    #[must_use]
    pub fn loader(&self) -> Option<&LoaderRef> {
        self.0.loader.as_ref()
    }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name && self.0.loader == other.0.loader
    }
}

impl Eq for ClassHandle {}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHandle")
            .field("name", &self.0.name)
            .field("loader", &self.0.loader)
            .finish()
    }
}

/// Textual type descriptor, e.g. `int`, `[B` or `java.lang.String`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    /// Returns the descriptor text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeDescriptor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TypeDescriptor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&ClassHandle> for TypeDescriptor {
    fn from(value: &ClassHandle) -> Self {
        Self(value.name().to_string())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One overload as reported by the runtime's member enumeration.
#[derive(Clone, Debug)]
pub struct MemberInfo {
    /// The class declaring this overload (may be a superclass of the queried class).
    pub declaring: ClassHandle,
    /// Ordered parameter types.
    pub params: Vec<TypeDescriptor>,
    /// Return type, `None` when the runtime cannot describe it.
    pub return_type: Option<TypeDescriptor>,
}

/// Stable identity of a method overload.
///
/// Used as registry key for interception bindings and for replaced bodies in the
/// runtime. Built from the declaring class, its loader, the natural method name and
/// the ordered parameter descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// Identifier of the declaring class' loader, if pinned.
    pub loader: Option<u64>,
    /// Declaring class name.
    pub class: String,
    /// Natural (runtime-side) method name.
    pub method: String,
    /// Parameter descriptors in order.
    pub params: Vec<String>,
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.class, self.method, self.params.join(", "))
    }
}

pub(crate) struct MethodInfo {
    pub(crate) declaring: ClassHandle,
    pub(crate) name: String,
    pub(crate) params: Vec<TypeDescriptor>,
    pub(crate) return_type: Option<TypeDescriptor>,
    pub(crate) constructor: bool,
    pub(crate) description: OnceLock<MethodDescription>,
}

/// Reference to one concrete overload of a named method.
///
/// Once resolved, the parameter list uniquely identifies the overload within its
/// declaring class. Constructors carry the synthetic name
/// [`CONSTRUCTOR_NAME`](crate::runtime::CONSTRUCTOR_NAME).
///
/// The `Display` form is the rendered signature, see [`crate::describe`].
#[derive(Clone)]
pub struct MethodHandle(pub(crate) Arc<MethodInfo>);

impl MethodHandle {
    /// Creates a method handle from a runtime member description.
    ///
    /// # Arguments
    ///
    /// * `name` - The API-side method name (`$init` for constructors)
    /// * `member` - The overload as reported by the runtime
    #[must_use]
    pub fn from_member(name: &str, member: MemberInfo) -> Self {
        Self(Arc::new(MethodInfo {
            declaring: member.declaring,
            name: name.to_string(),
            params: member.params,
            return_type: member.return_type,
            constructor: name == CONSTRUCTOR_NAME,
            description: OnceLock::new(),
        }))
    }

    /// Returns the declaring class.
    #[must_use]
    pub fn declaring_class(&self) -> &ClassHandle {
        &self.0.declaring
    }

    /// Returns the API-side method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the name the runtime uses for this member.
    #[must_use]
    pub fn runtime_name(&self) -> &str {
        if self.0.constructor {
            NATIVE_CONSTRUCTOR_NAME
        } else {
            &self.0.name
        }
    }

    /// Returns the ordered parameter types.
    #[must_use]
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.0.params
    }

    /// Returns the return type, if the runtime could describe it.
    #[must_use]
    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.0.return_type.as_ref()
    }

    /// Returns `true` for constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.0.constructor
    }

    /// Returns the stable identity of this overload.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        MethodKey {
            loader: self.0.declaring.loader().map(LoaderRef::id),
            class: self.0.declaring.name().to_string(),
            method: self.runtime_name().to_string(),
            params: self.0.params.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

impl PartialEq for MethodHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MethodHandle {}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("class", &self.0.declaring.name())
            .field("name", &self.0.name)
            .field("params", &self.0.params)
            .field("return_type", &self.0.return_type)
            .finish()
    }
}

/// Ordered collection of overloads sharing a declaring class and a method name.
#[derive(Clone, Debug)]
pub struct MethodOverloadSet {
    class: ClassHandle,
    name: String,
    overloads: Vec<MethodHandle>,
}

impl MethodOverloadSet {
    /// Creates an overload set.
    #[must_use]
    pub fn new(class: ClassHandle, name: impl Into<String>, overloads: Vec<MethodHandle>) -> Self {
        Self {
            class,
            name: name.into(),
            overloads,
        }
    }

    /// Returns the class the set was resolved on.
    #[must_use]
    pub fn class(&self) -> &ClassHandle {
        &self.class
    }

    /// Returns the shared method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of overloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    /// Returns `true` if the set holds no overload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }

    /// Returns an iterator over the overloads in runtime order.
    pub fn iter(&self) -> impl Iterator<Item = &MethodHandle> {
        self.overloads.iter()
    }
}

impl IntoIterator for MethodOverloadSet {
    type Item = MethodHandle;
    type IntoIter = std::vec::IntoIter<MethodHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.overloads.into_iter()
    }
}

/// Identity of the thread executing an intercepted call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Process-level thread id.
    pub id: u64,
    /// Runtime-level thread display name.
    pub name: String,
}

/// One entry of a captured call stack. Immutable once captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    /// Declaring-type name of the frame's method.
    pub class_name: String,
    /// Method name of the frame.
    pub method_name: String,
    /// Textual representation, e.g. `com.example.Foo.bar(Foo.java:12)`.
    pub text: String,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
