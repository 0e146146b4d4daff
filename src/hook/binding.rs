//! Interception bindings and the call-through handle.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    runtime::{ManagedRuntime, MethodHandle, Value},
    Result,
};

/// Replacement implementation of an intercepted method.
///
/// Receives the [`CallThrough`] bound to the original body, the receiver and the
/// arguments; whatever it returns is what the intercepted call returns. A replacement
/// that never invokes the call-through fully overrides the method.
///
/// # Thread Safety
///
/// Replacements run on every thread that calls the intercepted method and must be
/// `Send + Sync`.
pub type Replacement = Arc<dyn Fn(&CallThrough, &Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Wraps a closure as a [`Replacement`].
///
/// # Examples
///
/// ```rust,no_run
/// use hookscope::{hook, Value};
///
/// let doubled = hook::replacement(|original, this, args| {
///     let result = original.call(this, args)?;
///     Ok(Value::Int(result.as_i64().unwrap_or_default() * 2))
/// });
/// ```
pub fn replacement<F>(f: F) -> Replacement
where
    F: Fn(&CallThrough, &Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle to the original, pre-interception body of a method.
///
/// Bound at installation time. Invoking it always runs the original body, no matter
/// how many times the method has been re-intercepted since. Stateless, cheap to clone
/// and safe to use from several threads at once.
#[derive(Clone)]
pub struct CallThrough {
    runtime: Weak<dyn ManagedRuntime>,
    method: MethodHandle,
}

impl CallThrough {
    pub(crate) fn new(runtime: &Arc<dyn ManagedRuntime>, method: MethodHandle) -> Self {
        CallThrough {
            runtime: Arc::downgrade(runtime),
            method,
        }
    }

    /// Runs the original body on `this` with `args`.
    ///
    /// # Errors
    ///
    /// Propagates whatever the original body raises, or fails if the runtime was
    /// already torn down.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        self.runtime()?.invoke_original(&self.method, this, args)
    }

    pub(crate) fn runtime(&self) -> Result<Arc<dyn ManagedRuntime>> {
        self.runtime
            .upgrade()
            .ok_or_else(|| runtime_error!("Runtime of {} is gone", self.method.key()))
    }

    /// Returns the intercepted method.
    #[must_use]
    pub fn method(&self) -> &MethodHandle {
        &self.method
    }
}

impl fmt::Debug for CallThrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallThrough")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Live association between a method and its replacement.
#[derive(Clone)]
pub enum InterceptionBinding {
    /// A replacement is installed.
    Active {
        /// Handle to the original body.
        call_through: CallThrough,
        /// The installed replacement.
        replacement: Replacement,
    },
    /// The method was intercepted before and has been restored.
    Inactive,
}

impl InterceptionBinding {
    /// Returns `true` for [`InterceptionBinding::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, InterceptionBinding::Active { .. })
    }

    /// Returns the call-through of an active binding.
    #[must_use]
    pub fn call_through(&self) -> Option<&CallThrough> {
        match self {
            InterceptionBinding::Active { call_through, .. } => Some(call_through),
            InterceptionBinding::Inactive => None,
        }
    }
}

impl fmt::Debug for InterceptionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptionBinding::Active { call_through, .. } => f
                .debug_struct("Active")
                .field("method", call_through.method())
                .finish_non_exhaustive(),
            InterceptionBinding::Inactive => f.write_str("Inactive"),
        }
    }
}
