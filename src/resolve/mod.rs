//! Class and method resolution.
//!
//! Script code names classes and methods as strings; this module turns those names
//! into handles the interception engine can act on.
//!
//! - [`ClassResolver`] - class lookup, pinned to a loading context or searched across all
//! - [`MethodResolver`] - overload lookup from an optional parameter signature
//! - [`first_success`] - the "first success, first error" search combinator

mod class;
mod method;

pub use class::{first_success, ClassResolver, LoaderScope};
pub use method::{MethodResolver, MethodSelection, SignatureElement};
