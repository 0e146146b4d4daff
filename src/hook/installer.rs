//! Installation and removal of method replacements.

use std::{fmt, sync::Arc};

use dashmap::DashMap;

use crate::{
    describe::enrich,
    hook::{CallThrough, InterceptionBinding, Replacement},
    log::{Log, ENGINE_TAG},
    runtime::{ManagedRuntime, MethodBody, MethodHandle, MethodKey},
    Result,
};

/// Installs and removes replacements, keeping one binding per method.
///
/// The runtime's dispatch state is rewritten first; the binding registry is only
/// updated once the rewrite succeeded, so a rejected rewrite leaves both untouched.
///
/// # Examples
///
/// ```rust,ignore
/// interceptor.install(&method, Some(hook::replacement(|original, this, args| {
///     original.call(this, args)
/// })))?;
///
/// // Restore the original body
/// interceptor.install(&method, None)?;
/// ```
pub struct Interceptor {
    runtime: Arc<dyn ManagedRuntime>,
    log: Arc<Log>,
    bindings: DashMap<MethodKey, InterceptionBinding>,
}

impl Interceptor {
    /// Creates an interceptor over `runtime`.
    pub fn new(runtime: Arc<dyn ManagedRuntime>, log: Arc<Log>) -> Self {
        Interceptor {
            runtime,
            log,
            bindings: DashMap::new(),
        }
    }

    /// Installs `replacement` on `method`, or restores the original body when `None`.
    ///
    /// A new replacement supersedes any previous one. The call-through handed to the
    /// replacement always reaches the original body. Both branches log the affected
    /// method at info level.
    ///
    /// # Errors
    ///
    /// Propagates the runtime's error if the handle is stale or the rewrite is rejected.
    pub fn install(&self, method: &MethodHandle, replacement: Option<Replacement>) -> Result<()> {
        let method = enrich(method);

        // The entry lock spans the rewrite so the registry and dispatch state agree.
        let entry = self.bindings.entry(method.key());
        let binding = match replacement {
            Some(replacement) => {
                let call_through = CallThrough::new(&self.runtime, method.clone());
                let body: MethodBody = {
                    let call_through = call_through.clone();
                    let replacement = replacement.clone();
                    Arc::new(move |this, args| replacement(&call_through, this, args))
                };

                self.runtime.replace_body(method, Some(body))?;
                InterceptionBinding::Active {
                    call_through,
                    replacement,
                }
            }
            None => {
                self.runtime.replace_body(method, None)?;
                InterceptionBinding::Inactive
            }
        };
        let active = binding.is_active();
        entry.insert(binding);

        if active {
            self.log.info(ENGINE_TAG, format!("Hook method: {method}"));
        } else {
            self.log.info(ENGINE_TAG, format!("Unhook method: {method}"));
        }

        Ok(())
    }

    /// Returns the binding recorded for `method`, if it was ever intercepted.
    #[must_use]
    pub fn binding(&self, method: &MethodHandle) -> Option<InterceptionBinding> {
        self.bindings.get(&method.key()).map(|b| b.value().clone())
    }

    /// Returns `true` if a replacement is currently installed on `method`.
    #[must_use]
    pub fn is_active(&self, method: &MethodHandle) -> bool {
        self.bindings
            .get(&method.key())
            .is_some_and(|b| b.is_active())
    }

    /// Returns the number of methods with an installed replacement.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_active()).count()
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("bindings", &self.bindings.len())
            .field("active", &self.active_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        thread,
        time::Duration,
    };

    use crate::{
        hook::replacement,
        log::LogLevel,
        runtime::{
            ClassHandle, EmulatedRuntime, LoaderRef, ManagedRuntime, MemberInfo, ObjectRef,
            StackFrame, ThreadInfo, Value,
        },
        sink::MemorySink,
        test::{create_test_runtime, greet_method},
        Error,
    };

    /// Runtime whose first body rewrite stalls after taking effect.
    struct StallingRuntime {
        inner: EmulatedRuntime,
        stalled: AtomicBool,
    }

    impl ManagedRuntime for StallingRuntime {
        fn version(&self) -> u32 {
            self.inner.version()
        }

        fn enumerate_loaders(&self) -> Result<Vec<LoaderRef>> {
            self.inner.enumerate_loaders()
        }

        fn active_loader(&self) -> Option<LoaderRef> {
            self.inner.active_loader()
        }

        fn set_active_loader(&self, loader: Option<LoaderRef>) {
            self.inner.set_active_loader(loader);
        }

        fn use_class(&self, name: &str) -> Result<ClassHandle> {
            self.inner.use_class(name)
        }

        fn members(&self, class: &ClassHandle, name: &str) -> Result<Vec<MemberInfo>> {
            self.inner.members(class, name)
        }

        fn declared_method_names(&self, class: &ClassHandle) -> Result<Vec<String>> {
            self.inner.declared_method_names(class)
        }

        fn superclass(&self, class: &ClassHandle) -> Result<Option<ClassHandle>> {
            self.inner.superclass(class)
        }

        fn replace_body(&self, method: &MethodHandle, body: Option<MethodBody>) -> Result<()> {
            self.inner.replace_body(method, body)?;
            if !self.stalled.swap(true, Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(200));
            }
            Ok(())
        }

        fn invoke_original(
            &self,
            method: &MethodHandle,
            this: &Value,
            args: &[Value],
        ) -> Result<Value> {
            self.inner.invoke_original(method, this, args)
        }

        fn current_thread(&self) -> Result<ThreadInfo> {
            self.inner.current_thread()
        }

        fn stack_trace(&self) -> Result<Vec<StackFrame>> {
            self.inner.stack_trace()
        }

        fn render(&self, object: &ObjectRef) -> Result<String> {
            self.inner.render(object)
        }

        fn enum_constants(&self, class: &ClassHandle) -> Result<Vec<Value>> {
            self.inner.enum_constants(class)
        }
    }

    fn setup() -> (Arc<EmulatedRuntime>, Interceptor, Arc<MemorySink>) {
        let runtime = Arc::new(create_test_runtime());
        let sink = Arc::new(MemorySink::new());
        let log = Arc::new(Log::new(sink.clone(), LogLevel::Info));
        let interceptor = Interceptor::new(runtime.clone(), log);
        (runtime, interceptor, sink)
    }

    #[test]
    fn test_install_and_remove() {
        let (runtime, interceptor, sink) = setup();
        let method = greet_method(&runtime);
        let args = [Value::from("ann")];
        let before = runtime.call(&method, &Value::Null, &args).unwrap();

        interceptor
            .install(&method, Some(replacement(|_, _, _| Ok(Value::from("override")))))
            .unwrap();
        assert!(interceptor.is_active(&method));
        assert_eq!(interceptor.active_count(), 1);
        assert_eq!(
            runtime.call(&method, &Value::Null, &args).unwrap(),
            Value::from("override")
        );

        interceptor.install(&method, None).unwrap();
        assert!(!interceptor.is_active(&method));
        assert!(matches!(
            interceptor.binding(&method),
            Some(InterceptionBinding::Inactive)
        ));
        assert_eq!(runtime.call(&method, &Value::Null, &args).unwrap(), before);

        let logs = sink.logs();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].message.as_str().unwrap().starts_with("Hook method: "));
        assert!(logs[1].message.as_str().unwrap().starts_with("Unhook method: "));
    }

    #[test]
    fn test_reinstall_keeps_original_call_through() {
        let (runtime, interceptor, _) = setup();
        let method = greet_method(&runtime);
        let args = [Value::from("ann")];
        let original = runtime.invoke_original(&method, &Value::Null, &args).unwrap();

        for _ in 0..3 {
            let pass_through = replacement(|original, this, args| original.call(this, args));
            interceptor.install(&method, Some(pass_through)).unwrap();
        }
        assert_eq!(runtime.call(&method, &Value::Null, &args).unwrap(), original);
        assert_eq!(interceptor.active_count(), 1);
    }

    #[test]
    fn test_rejected_rewrite_leaves_state() {
        let (runtime, interceptor, sink) = setup();
        let sealed = crate::test::sealed_method(&runtime);

        let err = interceptor
            .install(&sealed, Some(replacement(|_, _, _| Ok(Value::Void))))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMember(_)));
        assert!(interceptor.binding(&sealed).is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_concurrent_installs_keep_registry_and_dispatch_in_sync() {
        let runtime = Arc::new(StallingRuntime {
            inner: create_test_runtime(),
            stalled: AtomicBool::new(false),
        });
        let log = Arc::new(Log::new(Arc::new(MemorySink::new()), LogLevel::Info));
        let interceptor = Interceptor::new(runtime.clone(), log);
        let method = greet_method(&runtime.inner);
        let args = [Value::from("ann")];

        thread::scope(|scope| {
            scope.spawn(|| {
                interceptor
                    .install(&method, Some(replacement(|_, _, _| Ok(Value::Int(1)))))
                    .unwrap();
            });

            while !runtime.stalled.load(Ordering::SeqCst) {
                thread::yield_now();
            }
            interceptor
                .install(&method, Some(replacement(|_, _, _| Ok(Value::Int(2)))))
                .unwrap();
        });

        assert_eq!(
            runtime.inner.call(&method, &Value::Null, &args).unwrap(),
            Value::Int(2)
        );
        let Some(InterceptionBinding::Active {
            call_through,
            replacement,
        }) = interceptor.binding(&method)
        else {
            panic!("expected an active binding");
        };
        assert_eq!(
            replacement(&call_through, &Value::Null, &args).unwrap(),
            Value::Int(2)
        );
    }
}
