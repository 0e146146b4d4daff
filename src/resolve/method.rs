//! Overload resolution from partial signatures.
//!
//! A method name on a class may resolve to several overloads. [`MethodResolver`]
//! narrows them down:
//!
//! - With a signature, exactly one overload whose parameter types equal the signature
//!   (element-wise, in order) is selected, or [`Error::OverloadNotFound`] is raised.
//! - Without a signature, the whole [`MethodOverloadSet`] is returned.
//!
//! # Undescribable Members
//!
//! Overloads whose return type the runtime cannot describe are left out of the
//! signature-less overload set without reporting an error. This is a lossy policy:
//! such members can still be selected with an explicit signature.
//!
//! # Constructors
//!
//! Constructors are requested with [`CONSTRUCTOR_NAME`] (`$init`); the resolver
//! translates it to the runtime's natural spelling before querying members.

use std::sync::Arc;

use crate::{
    describe::qualified_class_name,
    runtime::{
        ClassHandle, ManagedRuntime, MethodHandle, MethodOverloadSet, TypeDescriptor,
        CONSTRUCTOR_NAME, NATIVE_CONSTRUCTOR_NAME,
    },
    Error, Result,
};

/// One element of a requested parameter signature.
#[derive(Clone, Debug)]
pub enum SignatureElement {
    /// Textual type descriptor, e.g. `int` or `java.lang.String`.
    Descriptor(String),
    /// A class, converted to its descriptor.
    Class(ClassHandle),
}

impl SignatureElement {
    /// Returns the textual descriptor of this element.
    #[must_use]
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            SignatureElement::Descriptor(text) => TypeDescriptor::from(text.as_str()),
            SignatureElement::Class(class) => TypeDescriptor::from(class),
        }
    }
}

impl From<&str> for SignatureElement {
    fn from(value: &str) -> Self {
        SignatureElement::Descriptor(value.to_string())
    }
}

impl From<String> for SignatureElement {
    fn from(value: String) -> Self {
        SignatureElement::Descriptor(value)
    }
}

impl From<ClassHandle> for SignatureElement {
    fn from(value: ClassHandle) -> Self {
        SignatureElement::Class(value)
    }
}

impl From<&ClassHandle> for SignatureElement {
    fn from(value: &ClassHandle) -> Self {
        SignatureElement::Class(value.clone())
    }
}

/// Outcome of a method resolution.
#[derive(Clone, Debug)]
pub enum MethodSelection {
    /// A signature was given and matched exactly one overload.
    Single(MethodHandle),
    /// No signature was given; all describable overloads.
    Overloads(MethodOverloadSet),
}

impl MethodSelection {
    /// Returns the handles of this selection in runtime order.
    #[must_use]
    pub fn into_handles(self) -> Vec<MethodHandle> {
        match self {
            MethodSelection::Single(method) => vec![method],
            MethodSelection::Overloads(set) => set.into_iter().collect(),
        }
    }
}

/// Resolves method names on a class to overloads.
pub struct MethodResolver {
    runtime: Arc<dyn ManagedRuntime>,
}

impl MethodResolver {
    /// Creates a resolver over `runtime`.
    pub fn new(runtime: Arc<dyn ManagedRuntime>) -> Self {
        MethodResolver { runtime }
    }

    /// Resolves `name` on `class`.
    ///
    /// # Arguments
    ///
    /// * `class` - The class to search, inherited overloads included
    /// * `name` - Method name, `$init` for constructors
    /// * `signature` - Ordered parameter types, or `None` for every overload
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverloadNotFound`] if a signature was given and no overload
    /// matches it exactly, or whatever the runtime raises during member enumeration.
    pub fn resolve(
        &self,
        class: &ClassHandle,
        name: &str,
        signature: Option<&[SignatureElement]>,
    ) -> Result<MethodSelection> {
        match signature {
            Some(signature) => self
                .resolve_exact(class, name, signature)
                .map(MethodSelection::Single),
            None => self.overloads(class, name).map(MethodSelection::Overloads),
        }
    }

    /// Returns the overload whose parameter types equal `signature`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverloadNotFound`] if no overload matches exactly.
    pub fn resolve_exact(
        &self,
        class: &ClassHandle,
        name: &str,
        signature: &[SignatureElement],
    ) -> Result<MethodHandle> {
        let wanted: Vec<TypeDescriptor> =
            signature.iter().map(SignatureElement::descriptor).collect();

        self.runtime
            .members(class, runtime_name(name))?
            .into_iter()
            .find(|member| member.params == wanted)
            .map(|member| MethodHandle::from_member(name, member))
            .ok_or_else(|| Error::OverloadNotFound {
                class: qualified_class_name(class).to_string(),
                method: name.to_string(),
                signature: wanted
                    .iter()
                    .map(TypeDescriptor::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Returns every overload of `name` whose return type the runtime can describe.
    ///
    /// # Errors
    ///
    /// Propagates failures of the runtime's member enumeration.
    pub fn overloads(&self, class: &ClassHandle, name: &str) -> Result<MethodOverloadSet> {
        let overloads = self
            .runtime
            .members(class, runtime_name(name))?
            .into_iter()
            .filter(|member| member.return_type.is_some())
            .map(|member| MethodHandle::from_member(name, member))
            .collect();

        Ok(MethodOverloadSet::new(class.clone(), name, overloads))
    }
}

fn runtime_name(name: &str) -> &str {
    if name == CONSTRUCTOR_NAME {
        NATIVE_CONSTRUCTOR_NAME
    } else {
        name
    }
}
