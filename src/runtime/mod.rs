//! Host runtime boundary.
//!
//! This module defines the façade over the host's class/member reflection API. The
//! interception engine never bypasses it: every class lookup, overload enumeration,
//! body replacement and call-through goes through [`ManagedRuntime`].
//!
//! # Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`handles`] | Class, loader and method handles, stack frames |
//! | [`value`] | The [`Value`] model exchanged with intercepted methods |
//! | [`emulated`] | [`EmulatedRuntime`], an in-process implementation of the trait |
//!
//! # Loading Contexts
//!
//! The runtime keeps an ambient *active* loading context that [`ManagedRuntime::use_class`]
//! resolves against. Callers that need a specific context pin it for the duration of a
//! lookup and restore the previous one afterwards, see [`crate::resolve::ClassResolver`].
//!
//! # Constructors
//!
//! Constructors are addressed with the synthetic name [`CONSTRUCTOR_NAME`] on the API
//! side. Runtime implementations receive the natural spelling [`NATIVE_CONSTRUCTOR_NAME`].

mod emulated;
mod handles;
mod value;

use std::sync::Arc;

pub use emulated::{ClassDef, EmulatedRuntime, EmulatedRuntimeBuilder, MethodDef, Rendering};
pub use handles::{
    ClassHandle, LoaderRef, MemberInfo, MethodHandle, MethodKey, MethodOverloadSet, StackFrame,
    ThreadInfo, TypeDescriptor,
};
pub use value::{ObjectRef, Value};

use crate::Result;

/// Synthetic method name used to address constructors.
pub const CONSTRUCTOR_NAME: &str = "$init";

/// The runtime's natural spelling of constructors.
pub const NATIVE_CONSTRUCTOR_NAME: &str = "<init>";

/// Root class at which hierarchy walks stop.
pub const OBJECT_CLASS_NAME: &str = "java.lang.Object";

/// Executable method body.
///
/// Receives the receiver (`this`, or the class for static methods) and the ordered
/// arguments, and produces the return value ([`Value::Void`] for `void` methods).
///
/// # Thread Safety
///
/// Bodies are invoked from whatever threads the host uses to execute the method and
/// must be `Send + Sync`.
pub type MethodBody = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Reflection API of a managed runtime.
///
/// Implementations wrap the host's primitives (class lookup, member enumeration, body
/// replacement). The trait is object safe; the engine holds it as
/// `Arc<dyn ManagedRuntime>`.
///
/// # Thread Safety
///
/// All methods may be called concurrently. Body replacement mutates process-wide
/// dispatch state; implementations are expected to serialize such rewrites internally.
pub trait ManagedRuntime: Send + Sync {
    /// Returns the runtime's major version.
    ///
    /// Runtimes below [`AgentConfig::loader_enumeration_min_version`](crate::AgentConfig)
    /// are resolved without loading-context enumeration.
    fn version(&self) -> u32;

    /// Returns the currently known loading contexts in natural discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot enumerate its loaders.
    fn enumerate_loaders(&self) -> Result<Vec<LoaderRef>>;

    /// Returns the loading context [`use_class`](Self::use_class) currently resolves against.
    fn active_loader(&self) -> Option<LoaderRef>;

    /// Replaces the active loading context.
    fn set_active_loader(&self, loader: Option<LoaderRef>);

    /// Looks up a class by name in the active loading context.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ClassNotFound`] if the class is not visible.
    fn use_class(&self, name: &str) -> Result<ClassHandle>;

    /// Returns every overload named `name` visible on `class`, own and inherited.
    ///
    /// `name` uses the runtime's natural spelling. Overloads whose return type cannot
    /// be described are reported with `return_type: None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the class handle is stale.
    fn members(&self, class: &ClassHandle, name: &str) -> Result<Vec<MemberInfo>>;

    /// Returns the names of the methods declared directly on `class`, constructors excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if the class handle is stale.
    fn declared_method_names(&self, class: &ClassHandle) -> Result<Vec<String>>;

    /// Returns the direct superclass of `class`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the class handle is stale.
    fn superclass(&self, class: &ClassHandle) -> Result<Option<ClassHandle>>;

    /// Installs `body` as the method's executable body, or restores the original when `None`.
    ///
    /// Either fully succeeds or leaves the previous dispatch state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedMember`] if the handle is stale or the member
    /// kind cannot be rewritten.
    fn replace_body(&self, method: &MethodHandle, body: Option<MethodBody>) -> Result<()>;

    /// Executes the original, pre-interception body of `method`.
    ///
    /// # Errors
    ///
    /// Propagates whatever the original body raises.
    fn invoke_original(&self, method: &MethodHandle, this: &Value, args: &[Value])
        -> Result<Value>;

    /// Returns the identity of the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the calling thread is not attached to the runtime.
    fn current_thread(&self) -> Result<ThreadInfo>;

    /// Materializes a fresh throwable and returns its stack frames, innermost first.
    ///
    /// # Errors
    ///
    /// Returns an error if the throwable cannot be created.
    fn stack_trace(&self) -> Result<Vec<StackFrame>>;

    /// Returns the textual rendering (`toString`) of an object.
    ///
    /// # Errors
    ///
    /// Propagates whatever the rendering raises.
    fn render(&self, object: &ObjectRef) -> Result<String>;

    /// Returns the constants of an enum class in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is not an enum.
    fn enum_constants(&self, class: &ClassHandle) -> Result<Vec<Value>>;
}
