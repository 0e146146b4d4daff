//! Method interception.
//!
//! Interception replaces a method's executable body process-wide. The replacement is
//! handed a [`CallThrough`] bound to the original body so it can delegate, decorate or
//! fully override the call.
//!
//! # Key Components
//!
//! - [`Interceptor`] - Installs and removes replacements, tracks one binding per method
//! - [`InterceptionBinding`] - `Active` (call-through + replacement) or `Inactive`
//! - [`CallThrough`] - Stateless handle invoking the original body
//! - [`Replacement`] - Type alias for replacement closures
//!
//! # Lifecycle
//!
//! ```text
//! install(m, Some(r))  ──►  Active { call_through, r }
//! install(m, Some(r2)) ──►  Active { call_through, r2 }   (r superseded)
//! install(m, None)     ──►  Inactive                      (original body restored)
//! ```
//!
//! Bindings persist until removed or until the process ends.

mod binding;
mod installer;

pub use binding::{replacement, CallThrough, InterceptionBinding, Replacement};
pub use installer::Interceptor;
