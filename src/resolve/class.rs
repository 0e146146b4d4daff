//! Class resolution across loading contexts.
//!
//! [`ClassResolver`] finds a class by name either in one explicitly given loading
//! context, or by searching every context the runtime currently knows about.
//!
//! # Search Policy
//!
//! | Request | Runtime version | Behavior |
//! |---------|-----------------|----------|
//! | pinned to a context | any | Resolve in that context only |
//! | unpinned | below threshold | Resolve directly in the active context |
//! | unpinned | at or above threshold | Try each enumerated context in order, first success wins |
//!
//! When every context fails, the error of the *first* attempted context is returned.
//! The threshold is [`AgentConfig::loader_enumeration_min_version`](crate::AgentConfig).

use std::sync::Arc;

use crate::{
    runtime::{ClassHandle, LoaderRef, ManagedRuntime},
    Error, Result,
};

/// Returns the first successful result of `attempt` over `candidates`.
///
/// Candidates are tried in iteration order and the search stops at the first `Ok`.
/// If every attempt fails, the error of the first attempt is returned and later
/// errors are dropped. An empty candidate list yields `Err(None)`.
///
/// # Arguments
///
/// * `candidates` - The candidates, in the order they should be tried
/// * `attempt` - Fallible operation applied to each candidate
///
/// # Examples
///
/// ```rust,ignore
/// let result = first_success([1, 2, 3], |n| if n == 2 { Ok(n) } else { Err(n) });
/// assert_eq!(result, Ok(2));
/// ```
pub fn first_success<I, T, E, F>(candidates: I, mut attempt: F) -> std::result::Result<T, Option<E>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> std::result::Result<T, E>,
{
    let mut first_error = None;
    for candidate in candidates {
        match attempt(candidate) {
            Ok(value) => return Ok(value),
            Err(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }
    Err(first_error)
}

/// Pins the runtime's active loading context for as long as it lives.
///
/// The previously active context is restored when the scope is dropped, on every
/// exit path including early returns through `?` and panics unwinding through it.
#[must_use = "the previous loading context is restored as soon as the scope is dropped"]
pub struct LoaderScope<'a> {
    runtime: &'a dyn ManagedRuntime,
    previous: Option<LoaderRef>,
}

impl<'a> LoaderScope<'a> {
    /// Makes `loader` the active context of `runtime`.
    pub fn pin(runtime: &'a dyn ManagedRuntime, loader: LoaderRef) -> Self {
        let previous = runtime.active_loader();
        runtime.set_active_loader(Some(loader));
        LoaderScope { runtime, previous }
    }
}

impl Drop for LoaderScope<'_> {
    fn drop(&mut self) {
        self.runtime.set_active_loader(self.previous.take());
    }
}

/// Resolves class names to [`ClassHandle`]s.
pub struct ClassResolver {
    runtime: Arc<dyn ManagedRuntime>,
    min_version: u32,
}

impl ClassResolver {
    /// Creates a resolver.
    ///
    /// # Arguments
    ///
    /// * `runtime` - The host runtime
    /// * `min_version` - Lowest runtime version on which loading contexts are enumerated
    pub fn new(runtime: Arc<dyn ManagedRuntime>, min_version: u32) -> Self {
        ClassResolver {
            runtime,
            min_version,
        }
    }

    /// Resolves `name`, optionally pinned to `loader`.
    ///
    /// # Arguments
    ///
    /// * `name` - Fully qualified class name
    /// * `loader` - Loading context to pin the lookup to; `None` searches all contexts
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if no searched context knows the class. For
    /// an unpinned search, the error is the one raised by the first context tried.
    pub fn resolve(&self, name: &str, loader: Option<&LoaderRef>) -> Result<ClassHandle> {
        match loader {
            Some(loader) => self.resolve_in(name, loader),
            None if self.runtime.version() < self.min_version => self.runtime.use_class(name),
            None => {
                let loaders = self.runtime.enumerate_loaders()?;
                first_success(loaders, |loader| self.resolve_in(name, &loader)).map_err(
                    |error| {
                        error.unwrap_or_else(|| Error::ClassNotFound {
                            name: name.to_string(),
                            loader: None,
                        })
                    },
                )
            }
        }
    }

    /// Resolves `name` with `loader` pinned as the active context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if the class is not visible from `loader`.
    pub fn resolve_in(&self, name: &str, loader: &LoaderRef) -> Result<ClassHandle> {
        let _scope = LoaderScope::pin(self.runtime.as_ref(), loader.clone());
        self.runtime.use_class(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::create_test_runtime;

    #[test]
    fn test_first_success_keeps_first_error() {
        let result: std::result::Result<u32, Option<&str>> =
            first_success(["a", "b", "c"], |name| Err(name));
        assert_eq!(result, Err(Some("a")));

        let result: std::result::Result<u32, Option<&str>> =
            first_success(["a", "b"], |name| if name == "b" { Ok(2) } else { Err(name) });
        assert_eq!(result, Ok(2));

        let result: std::result::Result<u32, Option<&str>> =
            first_success(Vec::<&str>::new(), |name| Err(name));
        assert_eq!(result, Err(None));
    }

    #[test]
    fn test_resolve_searches_loaders() {
        let runtime = Arc::new(create_test_runtime());
        let resolver = ClassResolver::new(runtime.clone(), 7);

        let class = resolver.resolve("com.example.Greeter", None).unwrap();
        assert_eq!(class.loader().map(LoaderRef::name), Some("app"));

        let plugin = resolver.resolve("com.example.plugin.Widget", None).unwrap();
        assert_eq!(plugin.loader().map(LoaderRef::name), Some("plugin"));
        assert!(runtime.active_loader().is_none());
    }

    #[test]
    fn test_resolve_reports_first_loader() {
        let runtime = Arc::new(create_test_runtime());
        let resolver = ClassResolver::new(runtime, 7);

        match resolver.resolve("com.example.Missing", None).unwrap_err() {
            Error::ClassNotFound { name, loader } => {
                assert_eq!(name, "com.example.Missing");
                assert_eq!(loader.as_deref(), Some("app"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pinned_scope_is_restored_on_failure() {
        let runtime = Arc::new(create_test_runtime());
        let app = runtime.loader("app").unwrap();
        let plugin = runtime.loader("plugin").unwrap();
        runtime.set_active_loader(Some(app.clone()));

        let resolver = ClassResolver::new(runtime.clone(), 7);
        assert!(resolver.resolve("com.example.Greeter", Some(&plugin)).is_err());
        assert_eq!(runtime.active_loader(), Some(app));
    }

    #[test]
    fn test_old_runtime_skips_enumeration() {
        let runtime = Arc::new(create_test_runtime());
        let resolver = ClassResolver::new(runtime, 99);

        // Only the boot context is active, application classes stay invisible.
        assert!(resolver.resolve("java.lang.Object", None).is_ok());
        match resolver.resolve("com.example.Greeter", None).unwrap_err() {
            Error::ClassNotFound { loader, .. } => assert!(loader.is_none()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
