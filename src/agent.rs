//! Scripting facade wiring all components together.
//!
//! An [`Agent`] is constructed once per process from a [`ManagedRuntime`], an
//! [`EventSink`] and an [`AgentConfig`], and owns every other component: resolvers,
//! the interceptor, the log and the script loader. Scripts only ever talk to the
//! agent; nothing in the crate is a global.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hookscope::{Agent, CaptureOptions, EmulatedRuntime, MemorySink};
//!
//! let sink = Arc::new(MemorySink::new());
//! let agent = Agent::builder(Arc::new(EmulatedRuntime::builder().build()))
//!     .sink(sink.clone())
//!     .build();
//!
//! // Report every call to any overload of `greet`, with arguments and thread
//! let options = CaptureOptions::default().with_args(true).with_thread(true);
//! let capture = agent.event_replacement(options);
//! agent.hook_methods("com.example.Greeter", "greet", Some(capture))?;
//! # Ok::<(), hookscope::Error>(())
//! ```

use std::{fmt, sync::Arc};

use crate::{
    capture::{CaptureOptions, EventCapture},
    config::AgentConfig,
    describe::qualified_class_name,
    hook::{Interceptor, Replacement},
    introspect::{capture_stack, pretty_string, render_arguments, render_stack, StackSnapshot},
    log::{Log, ENGINE_TAG},
    resolve::{ClassResolver, MethodResolver, MethodSelection, SignatureElement},
    runtime::{
        ClassHandle, LoaderRef, ManagedRuntime, MethodHandle, MethodOverloadSet, Value,
        CONSTRUCTOR_NAME, OBJECT_CLASS_NAME,
    },
    script::{Parameters, Script, ScriptEvaluator, ScriptLoader},
    sink::{EventSink, WriterSink},
    Error, Result,
};

/// A class given either by name or as an already resolved handle.
#[derive(Clone, Debug)]
pub enum ClassTarget {
    /// Fully qualified name, resolved across all loading contexts.
    Name(String),
    /// Resolved class.
    Handle(ClassHandle),
}

impl From<&str> for ClassTarget {
    fn from(value: &str) -> Self {
        ClassTarget::Name(value.to_string())
    }
}

impl From<String> for ClassTarget {
    fn from(value: String) -> Self {
        ClassTarget::Name(value)
    }
}

impl From<ClassHandle> for ClassTarget {
    fn from(value: ClassHandle) -> Self {
        ClassTarget::Handle(value)
    }
}

impl From<&ClassHandle> for ClassTarget {
    fn from(value: &ClassHandle) -> Self {
        ClassTarget::Handle(value.clone())
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    runtime: Arc<dyn ManagedRuntime>,
    sink: Option<Arc<dyn EventSink>>,
    config: AgentConfig,
}

impl AgentBuilder {
    /// Sets the event sink. Defaults to newline-delimited JSON on stdout.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the agent.
    #[must_use]
    pub fn build(self) -> Agent {
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(WriterSink::new(std::io::stdout())));
        let log = Arc::new(Log::new(sink.clone(), self.config.log_level));

        Agent {
            classes: ClassResolver::new(
                self.runtime.clone(),
                self.config.loader_enumeration_min_version,
            ),
            methods: MethodResolver::new(self.runtime.clone()),
            interceptor: Interceptor::new(self.runtime.clone(), log.clone()),
            scripts: ScriptLoader::new(),
            runtime: self.runtime,
            config: self.config,
            sink,
            log,
        }
    }
}

/// Entry point for scripts: class lookup, hooking, capture and introspection.
pub struct Agent {
    runtime: Arc<dyn ManagedRuntime>,
    config: AgentConfig,
    sink: Arc<dyn EventSink>,
    log: Arc<Log>,
    classes: ClassResolver,
    methods: MethodResolver,
    interceptor: Interceptor,
    scripts: ScriptLoader,
}

impl Agent {
    /// Starts building an agent over `runtime`.
    pub fn builder(runtime: Arc<dyn ManagedRuntime>) -> AgentBuilder {
        AgentBuilder {
            runtime,
            sink: None,
            config: AgentConfig::default(),
        }
    }

    /// Returns the host runtime.
    #[must_use]
    pub fn runtime(&self) -> &Arc<dyn ManagedRuntime> {
        &self.runtime
    }

    /// Returns the configuration the agent was built with.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the log.
    #[must_use]
    pub fn log(&self) -> &Arc<Log> {
        &self.log
    }

    /// Returns the event sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Returns the interceptor.
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Finds a class, optionally pinned to `loader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if no searched loading context knows the class.
    pub fn find_class(&self, name: &str, loader: Option<&LoaderRef>) -> Result<ClassHandle> {
        self.classes.resolve(name, loader)
    }

    /// Finds the overload of `name` whose parameter types equal `signature`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] or [`Error::OverloadNotFound`].
    pub fn find_method(
        &self,
        class: impl Into<ClassTarget>,
        name: &str,
        signature: &[SignatureElement],
    ) -> Result<MethodHandle> {
        let class = self.class_handle(class.into())?;
        self.methods.resolve_exact(&class, name, signature)
    }

    /// Finds every describable overload of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] or the runtime's enumeration failure.
    pub fn find_methods(
        &self,
        class: impl Into<ClassTarget>,
        name: &str,
    ) -> Result<MethodOverloadSet> {
        let class = self.class_handle(class.into())?;
        self.methods.overloads(&class, name)
    }

    /// Hooks one method, or unhooks it when `replacement` is `None`.
    ///
    /// Without a signature, `name` must resolve to exactly one overload.
    ///
    /// # Arguments
    ///
    /// * `class` - Class name or handle
    /// * `name` - Method name, `$init` for constructors
    /// * `signature` - Parameter types selecting the overload
    /// * `replacement` - The replacement, `None` to restore the original
    ///
    /// # Errors
    ///
    /// - [`Error::ClassNotFound`] or [`Error::OverloadNotFound`] from resolution
    /// - [`Error::AmbiguousOverload`] if no signature was given and several overloads exist
    /// - The runtime's failure if the rewrite is rejected
    pub fn hook_method(
        &self,
        class: impl Into<ClassTarget>,
        name: &str,
        signature: Option<&[SignatureElement]>,
        replacement: Option<Replacement>,
    ) -> Result<MethodHandle> {
        let class = self.class_handle(class.into())?;
        let method = match self.methods.resolve(&class, name, signature)? {
            MethodSelection::Single(method) => method,
            MethodSelection::Overloads(overloads) => match overloads.len() {
                1 => overloads.into_iter().next().ok_or_else(|| {
                    runtime_error!("Overload set of {} changed during resolution", name)
                })?,
                0 => {
                    return Err(Error::OverloadNotFound {
                        class: qualified_class_name(&class).to_string(),
                        method: name.to_string(),
                        signature: String::new(),
                    })
                }
                count => {
                    return Err(Error::AmbiguousOverload {
                        class: qualified_class_name(&class).to_string(),
                        method: name.to_string(),
                        count,
                    })
                }
            },
        };

        self.interceptor.install(&method, replacement)?;
        Ok(method)
    }

    /// Hooks (or unhooks) an already resolved method.
    ///
    /// # Errors
    ///
    /// Propagates the runtime's failure if the rewrite is rejected.
    pub fn hook_method_handle(
        &self,
        method: &MethodHandle,
        replacement: Option<Replacement>,
    ) -> Result<()> {
        self.interceptor.install(method, replacement)
    }

    /// Hooks (or unhooks) every describable overload of `name`.
    ///
    /// Stops at the first rejected overload; overloads hooked before it stay hooked.
    ///
    /// # Errors
    ///
    /// Returns resolution failures or the first rejected rewrite.
    pub fn hook_methods(
        &self,
        class: impl Into<ClassTarget>,
        name: &str,
        replacement: Option<Replacement>,
    ) -> Result<MethodOverloadSet> {
        let class = self.class_handle(class.into())?;
        self.hook_overloads(&class, name, replacement.as_ref())
    }

    /// Hooks (or unhooks) every constructor of the class.
    ///
    /// # Errors
    ///
    /// Returns resolution failures or the first rejected rewrite.
    pub fn hook_all_constructors(
        &self,
        class: impl Into<ClassTarget>,
        replacement: Option<Replacement>,
    ) -> Result<MethodOverloadSet> {
        let class = self.class_handle(class.into())?;
        self.hook_overloads(&class, CONSTRUCTOR_NAME, replacement.as_ref())
    }

    /// Hooks (or unhooks) every method of the class, inherited ones included.
    ///
    /// Method names declared on the class and its superclasses up to, but excluding,
    /// `java.lang.Object` are collected; each distinct name is hooked once through
    /// [`hook_methods`](Self::hook_methods) on the class itself. Returns the number of
    /// overloads hooked.
    ///
    /// # Errors
    ///
    /// Returns resolution failures or the first rejected rewrite.
    pub fn hook_all_methods(
        &self,
        class: impl Into<ClassTarget>,
        replacement: Option<Replacement>,
    ) -> Result<usize> {
        let class = self.class_handle(class.into())?;
        self.hook_declared(&class, replacement.as_ref())
    }

    /// Hooks (or unhooks) every constructor, then every method, of the class.
    ///
    /// # Errors
    ///
    /// Returns resolution failures or the first rejected rewrite.
    pub fn hook_class(
        &self,
        class: impl Into<ClassTarget>,
        replacement: Option<Replacement>,
    ) -> Result<usize> {
        let class = self.class_handle(class.into())?;
        let constructors = self.hook_overloads(&class, CONSTRUCTOR_NAME, replacement.as_ref())?;
        Ok(constructors.len() + self.hook_declared(&class, replacement.as_ref())?)
    }

    /// Builds a replacement that calls through and reports each call.
    #[must_use]
    pub fn event_replacement(&self, options: CaptureOptions) -> Replacement {
        EventCapture::new(options, self.sink.clone(), self.log.clone()).into_replacement()
    }

    /// Captures the calling thread's stack.
    ///
    /// # Errors
    ///
    /// Propagates the runtime's failure to materialize a throwable.
    pub fn stack_trace(&self) -> Result<StackSnapshot> {
        capture_stack(self.runtime.as_ref())
    }

    /// Logs the calling thread's stack at info level as `{"stack": text}`.
    ///
    /// # Errors
    ///
    /// Propagates the runtime's failure to materialize a throwable.
    pub fn print_stack(&self) -> Result<()> {
        let stack = self.stack_trace()?;
        self.log.info(
            ENGINE_TAG,
            serde_json::json!({ "stack": render_stack(stack.frames()) }),
        );
        Ok(())
    }

    /// Logs arguments and optional return value at info level as `{"arguments": text}`.
    pub fn print_arguments(&self, args: &[Value], result: Option<&Value>) {
        let text = render_arguments(args, result, self.runtime.as_ref());
        self.log
            .info(ENGINE_TAG, serde_json::json!({ "arguments": text }));
    }

    /// Renders a value the way events and argument dumps do.
    #[must_use]
    pub fn pretty_string(&self, value: &Value) -> String {
        pretty_string(value, self.runtime.as_ref())
    }

    /// Returns the enum constant of `class` whose rendering equals `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnumConstantNotFound`] if no constant matches, or the runtime's
    /// failure if `class` is not an enum.
    pub fn enum_value(&self, class: impl Into<ClassTarget>, name: &str) -> Result<Value> {
        let class = self.class_handle(class.into())?;
        self.runtime
            .enum_constants(&class)?
            .into_iter()
            .find(|constant| self.pretty_string(constant) == name)
            .ok_or_else(|| Error::EnumConstantNotFound {
                class: qualified_class_name(&class).to_string(),
                name: name.to_string(),
            })
    }

    /// Publishes `parameters` and evaluates `scripts` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParametersFrozen`] on a second load, or [`Error::ScriptLoad`]
    /// naming the first failing script.
    pub fn load_scripts(
        &self,
        scripts: &[Script],
        parameters: Parameters,
        evaluator: &mut dyn ScriptEvaluator,
    ) -> Result<()> {
        self.scripts.load(scripts, parameters, evaluator)
    }

    /// Returns the parameters published by [`load_scripts`](Self::load_scripts).
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        self.scripts.parameters()
    }

    fn class_handle(&self, target: ClassTarget) -> Result<ClassHandle> {
        match target {
            ClassTarget::Name(name) => self.classes.resolve(&name, None),
            ClassTarget::Handle(handle) => Ok(handle),
        }
    }

    fn hook_overloads(
        &self,
        class: &ClassHandle,
        name: &str,
        replacement: Option<&Replacement>,
    ) -> Result<MethodOverloadSet> {
        let overloads = self.methods.overloads(class, name)?;
        for method in overloads.iter() {
            self.interceptor.install(method, replacement.cloned())?;
        }
        Ok(overloads)
    }

    fn hook_declared(
        &self,
        class: &ClassHandle,
        replacement: Option<&Replacement>,
    ) -> Result<usize> {
        let mut names: Vec<String> = Vec::new();
        let mut hooked = 0;
        let mut current = Some(class.clone());

        while let Some(declaring) = current {
            if declaring.name() == OBJECT_CLASS_NAME {
                break;
            }
            for name in self.runtime.declared_method_names(&declaring)? {
                if !names.contains(&name) {
                    hooked += self.hook_overloads(class, &name, replacement)?.len();
                    names.push(name);
                }
            }
            current = self.runtime.superclass(&declaring)?;
        }

        Ok(hooked)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
