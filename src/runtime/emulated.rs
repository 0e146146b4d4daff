//! In-process managed runtime.
//!
//! [`EmulatedRuntime`] implements [`ManagedRuntime`] entirely in memory: loading contexts
//! with parent delegation to a boot context, single-inheritance class hierarchies,
//! overloads whose original bodies are closures, replaceable bodies, a per-thread call
//! stack for stack traces, and objects with scripted renderings (including renderings
//! that fail).
//!
//! It is the runtime the test suites and benchmarks run against, and a host-less
//! playground for scripts.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hookscope::{ClassDef, EmulatedRuntime, MethodDef, Value};
//!
//! let runtime = EmulatedRuntime::builder()
//!     .version(30)
//!     .loader("dalvik.system.PathClassLoader")
//!     .class(
//!         ClassDef::new("com.example.Greeter")
//!             .in_loader("dalvik.system.PathClassLoader")
//!             .method(MethodDef::new(
//!                 "greet",
//!                 &["java.lang.String"],
//!                 "java.lang.String",
//!                 |_this, args| Ok(Value::Str(format!("hello {}", args[0]))),
//!             )),
//!     )
//!     .build();
//! ```

use std::{
    cell::RefCell,
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use dashmap::DashMap;

use crate::{
    runtime::{
        ClassHandle, LoaderRef, ManagedRuntime, MemberInfo, MethodBody, MethodHandle, MethodKey,
        ObjectRef, StackFrame, ThreadInfo, TypeDescriptor, Value, NATIVE_CONSTRUCTOR_NAME,
        OBJECT_CLASS_NAME,
    },
    Error, Result,
};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CALL_STACK: RefCell<Vec<StackFrame>> = const { RefCell::new(Vec::new()) };
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Scripted textual rendering of an emulated object.
#[derive(Clone, Debug)]
pub enum Rendering {
    /// `toString` returns this text.
    Text(String),
    /// `toString` raises with this message.
    Throws(String),
}

/// Definition of one emulated overload.
pub struct MethodDef {
    name: String,
    params: Vec<TypeDescriptor>,
    return_type: Option<TypeDescriptor>,
    body: MethodBody,
    rewritable: bool,
}

impl MethodDef {
    /// Defines a method overload.
    ///
    /// # Arguments
    ///
    /// * `name` - The method name
    /// * `params` - Ordered parameter descriptors
    /// * `return_type` - Return type descriptor
    /// * `body` - The original body
    pub fn new<F>(name: &str, params: &[&str], return_type: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| TypeDescriptor::from(*p)).collect(),
            return_type: Some(TypeDescriptor::from(return_type)),
            body: Arc::new(body),
            rewritable: true,
        }
    }

    /// Defines a constructor overload.
    pub fn constructor<F>(params: &[&str], body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(NATIVE_CONSTRUCTOR_NAME, params, "void", body)
    }

    /// Marks the return type as not describable by the runtime.
    #[must_use]
    pub fn undescribed(mut self) -> Self {
        self.return_type = None;
        self
    }

    /// Marks the overload as a member kind whose body cannot be replaced.
    #[must_use]
    pub fn not_rewritable(mut self) -> Self {
        self.rewritable = false;
        self
    }
}

/// Definition of one emulated class.
pub struct ClassDef {
    name: String,
    loader: Option<String>,
    superclass: Option<String>,
    wrapper_name: bool,
    methods: Vec<MethodDef>,
    enum_constants: Vec<String>,
}

impl ClassDef {
    /// Defines a class in the boot context, extending `java.lang.Object`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            loader: None,
            superclass: (name != OBJECT_CLASS_NAME).then(|| OBJECT_CLASS_NAME.to_string()),
            wrapper_name: true,
            methods: Vec::new(),
            enum_constants: Vec::new(),
        }
    }

    /// Places the class in the named loading context.
    #[must_use]
    pub fn in_loader(mut self, loader: &str) -> Self {
        self.loader = Some(loader.to_string());
        self
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    /// Drops the name cached by the class wrapper.
    #[must_use]
    pub fn without_wrapper_name(mut self) -> Self {
        self.wrapper_name = false;
        self
    }

    /// Adds an overload.
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds an enum constant, an instance of the class rendering as `name`.
    #[must_use]
    pub fn enum_constant(mut self, name: &str) -> Self {
        self.enum_constants.push(name.to_string());
        self
    }
}

struct ClassEntry {
    handle: ClassHandle,
    superclass: Option<String>,
    methods: Vec<MethodDef>,
    enum_constants: Vec<Value>,
}

/// Builder for [`EmulatedRuntime`].
pub struct EmulatedRuntimeBuilder {
    version: u32,
    loaders: Vec<String>,
    classes: Vec<ClassDef>,
    detached: bool,
}

impl EmulatedRuntimeBuilder {
    /// Sets the runtime major version (default: 30).
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Makes thread and stack introspection fail, as for a thread the host never attached.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Registers a loading context. Contexts are enumerated in registration order.
    #[must_use]
    pub fn loader(mut self, name: &str) -> Self {
        if !self.loaders.iter().any(|l| l == name) {
            self.loaders.push(name.to_string());
        }
        self
    }

    /// Registers a class. Its loading context is registered implicitly.
    #[must_use]
    pub fn class(mut self, class: ClassDef) -> Self {
        if let Some(loader) = &class.loader {
            if !self.loaders.iter().any(|l| l == loader) {
                self.loaders.push(loader.clone());
            }
        }
        self.classes.push(class);
        self
    }

    /// Builds the runtime. `java.lang.Object` is added to the boot context if missing.
    #[must_use]
    pub fn build(self) -> EmulatedRuntime {
        let loaders: Vec<LoaderRef> = self
            .loaders
            .iter()
            .zip(1u64..)
            .map(|(name, id)| LoaderRef::new(id, name.as_str()))
            .collect();

        let renderings = DashMap::new();
        let mut next_object = 0x1000;
        let mut classes = HashMap::new();
        let mut defs = self.classes;
        if !defs
            .iter()
            .any(|c| c.name == OBJECT_CLASS_NAME && c.loader.is_none())
        {
            defs.push(ClassDef::new(OBJECT_CLASS_NAME));
        }

        for def in defs {
            let loader = def
                .loader
                .as_ref()
                .and_then(|name| loaders.iter().find(|l| l.name() == name))
                .cloned();
            let wrapper_name = def.wrapper_name.then(|| def.name.clone());
            let key = (loader.as_ref().map(LoaderRef::id), def.name.clone());
            let enum_constants = def
                .enum_constants
                .into_iter()
                .map(|name| {
                    let handle = next_object;
                    next_object += 1;
                    renderings.insert(handle, Rendering::Text(name));
                    Value::Object(ObjectRef::new(handle, def.name.as_str()))
                })
                .collect();
            let handle = ClassHandle::new(def.name, loader, wrapper_name);
            classes.insert(
                key,
                ClassEntry {
                    handle,
                    superclass: def.superclass,
                    methods: def.methods,
                    enum_constants,
                },
            );
        }

        EmulatedRuntime {
            version: self.version,
            loaders,
            classes,
            active_loader: RwLock::new(None),
            replaced: DashMap::new(),
            renderings,
            next_object: AtomicU64::new(next_object),
            detached: self.detached,
        }
    }
}

/// In-memory implementation of [`ManagedRuntime`].
///
/// Class definitions are immutable after [`build`](EmulatedRuntimeBuilder::build);
/// replaced bodies and object renderings live in concurrent maps.
pub struct EmulatedRuntime {
    version: u32,
    loaders: Vec<LoaderRef>,
    classes: HashMap<(Option<u64>, String), ClassEntry>,
    active_loader: RwLock<Option<LoaderRef>>,
    replaced: DashMap<MethodKey, MethodBody>,
    renderings: DashMap<u64, Rendering>,
    next_object: AtomicU64,
    detached: bool,
}

impl EmulatedRuntime {
    /// Creates a builder with version 30 and no loading contexts.
    #[must_use]
    pub fn builder() -> EmulatedRuntimeBuilder {
        EmulatedRuntimeBuilder {
            version: 30,
            loaders: Vec::new(),
            classes: Vec::new(),
            detached: false,
        }
    }

    /// Returns the loading context registered under `name`.
    #[must_use]
    pub fn loader(&self, name: &str) -> Option<LoaderRef> {
        self.loaders.iter().find(|l| l.name() == name).cloned()
    }

    /// Allocates an object of `class_name` with the given rendering.
    pub fn new_object(&self, class_name: &str, rendering: Rendering) -> ObjectRef {
        let handle = self.next_object.fetch_add(1, Ordering::Relaxed);
        self.renderings.insert(handle, rendering);
        ObjectRef::new(handle, class_name)
    }

    /// Returns `true` if a replacement body is installed for `method`.
    #[must_use]
    pub fn is_replaced(&self, method: &MethodHandle) -> bool {
        self.replaced.contains_key(&method.key())
    }

    /// Invokes `method` the way the host dispatches it.
    ///
    /// Routes through an installed replacement body if present, otherwise runs the
    /// original. A frame for the method is on the calling thread's stack for the
    /// duration of the call.
    ///
    /// # Errors
    ///
    /// Propagates whatever the executed body raises.
    pub fn call(&self, method: &MethodHandle, this: &Value, args: &[Value]) -> Result<Value> {
        let _frame = FrameGuard::push(method);

        // Clone out of the map so a body may re-install itself without deadlocking.
        let replaced = self
            .replaced
            .get(&method.key())
            .map(|body| Arc::clone(body.value()));
        match replaced {
            Some(body) => body(this, args),
            None => self.invoke_original(method, this, args),
        }
    }

    fn find_entry(&self, loader: Option<u64>, name: &str) -> Option<&ClassEntry> {
        self.classes
            .get(&(loader, name.to_string()))
            .or_else(|| self.classes.get(&(None, name.to_string())))
    }

    fn entry(&self, class: &ClassHandle) -> Result<&ClassEntry> {
        self.classes
            .get(&(class.loader().map(LoaderRef::id), class.name().to_string()))
            .ok_or_else(|| runtime_error!("Stale class handle - {}", class.name()))
    }

    fn superclass_entry(&self, entry: &ClassEntry) -> Option<&ClassEntry> {
        let name = entry.superclass.as_ref()?;
        self.find_entry(entry.handle.loader().map(LoaderRef::id), name)
    }

    fn method_def(&self, method: &MethodHandle) -> Result<&MethodDef> {
        let stale = || Error::UnsupportedMember(format!("Stale method handle - {}", method.key()));
        let entry = self.entry(method.declaring_class()).map_err(|_| stale())?;
        entry
            .methods
            .iter()
            .find(|m| m.name == method.runtime_name() && m.params == method.params())
            .ok_or_else(stale)
    }
}

impl ManagedRuntime for EmulatedRuntime {
    fn version(&self) -> u32 {
        self.version
    }

    fn enumerate_loaders(&self) -> Result<Vec<LoaderRef>> {
        Ok(self.loaders.clone())
    }

    fn active_loader(&self) -> Option<LoaderRef> {
        read_lock!(self.active_loader).clone()
    }

    fn set_active_loader(&self, loader: Option<LoaderRef>) {
        *write_lock!(self.active_loader) = loader;
    }

    fn use_class(&self, name: &str) -> Result<ClassHandle> {
        let active = self.active_loader();
        self.find_entry(active.as_ref().map(LoaderRef::id), name)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| Error::ClassNotFound {
                name: name.to_string(),
                loader: active.map(|l| l.name().to_string()),
            })
    }

    fn members(&self, class: &ClassHandle, name: &str) -> Result<Vec<MemberInfo>> {
        let mut members: Vec<MemberInfo> = Vec::new();
        let mut current = Some(self.entry(class)?);

        while let Some(entry) = current {
            for def in entry.methods.iter().filter(|m| m.name == name) {
                if !members.iter().any(|m| m.params == def.params) {
                    members.push(MemberInfo {
                        declaring: entry.handle.clone(),
                        params: def.params.clone(),
                        return_type: def.return_type.clone(),
                    });
                }
            }
            if name == NATIVE_CONSTRUCTOR_NAME {
                break;
            }
            current = self.superclass_entry(entry);
        }

        Ok(members)
    }

    fn declared_method_names(&self, class: &ClassHandle) -> Result<Vec<String>> {
        let entry = self.entry(class)?;
        let mut names: Vec<String> = Vec::new();
        for def in &entry.methods {
            if def.name != NATIVE_CONSTRUCTOR_NAME && !names.contains(&def.name) {
                names.push(def.name.clone());
            }
        }
        Ok(names)
    }

    fn superclass(&self, class: &ClassHandle) -> Result<Option<ClassHandle>> {
        let entry = self.entry(class)?;
        Ok(self.superclass_entry(entry).map(|e| e.handle.clone()))
    }

    fn replace_body(&self, method: &MethodHandle, body: Option<MethodBody>) -> Result<()> {
        let def = self.method_def(method)?;
        if !def.rewritable {
            return Err(Error::UnsupportedMember(format!(
                "Body of {} cannot be replaced",
                method.key()
            )));
        }

        match body {
            Some(body) => {
                self.replaced.insert(method.key(), body);
            }
            None => {
                self.replaced.remove(&method.key());
            }
        }
        Ok(())
    }

    fn invoke_original(
        &self,
        method: &MethodHandle,
        this: &Value,
        args: &[Value],
    ) -> Result<Value> {
        let body = Arc::clone(&self.method_def(method)?.body);
        body(this, args)
    }

    fn current_thread(&self) -> Result<ThreadInfo> {
        if self.detached {
            return Err(runtime_error!("Current thread is not attached to the runtime"));
        }
        let id = THREAD_ID.with(|id| *id);
        let name = std::thread::current()
            .name()
            .map_or_else(|| format!("Thread-{id}"), str::to_string);
        Ok(ThreadInfo { id, name })
    }

    fn stack_trace(&self) -> Result<Vec<StackFrame>> {
        if self.detached {
            return Err(runtime_error!("Cannot create a throwable on a detached thread"));
        }
        Ok(CALL_STACK.with(|stack| stack.borrow().iter().rev().cloned().collect()))
    }

    fn render(&self, object: &ObjectRef) -> Result<String> {
        match self.renderings.get(&object.handle()).map(|r| r.value().clone()) {
            Some(Rendering::Text(text)) => Ok(text),
            Some(Rendering::Throws(message)) => Err(runtime_error!(message)),
            None => Ok(format!("{}@{:x}", object.class_name(), object.handle())),
        }
    }

    fn enum_constants(&self, class: &ClassHandle) -> Result<Vec<Value>> {
        let entry = self.entry(class)?;
        if entry.enum_constants.is_empty() {
            return Err(runtime_error!("{} is not an enum", class.name()));
        }
        Ok(entry.enum_constants.clone())
    }
}

struct FrameGuard;

impl FrameGuard {
    fn push(method: &MethodHandle) -> Self {
        let class_name = method.declaring_class().name().to_string();
        let method_name = method.runtime_name().to_string();
        let text = format!("{class_name}.{method_name}(Emulated)");
        CALL_STACK.with(|stack| {
            stack.borrow_mut().push(StackFrame {
                class_name,
                method_name,
                text,
            });
        });
        FrameGuard
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        CALL_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::create_test_runtime;

    fn greet(runtime: &EmulatedRuntime) -> MethodHandle {
        runtime.set_active_loader(runtime.loader("app"));
        let class = runtime.use_class("com.example.Greeter").unwrap();
        runtime.set_active_loader(None);
        let member = runtime
            .members(&class, "greet")
            .unwrap()
            .into_iter()
            .find(|m| m.params.len() == 1)
            .unwrap();
        MethodHandle::from_member("greet", member)
    }

    #[test]
    fn test_use_class_delegates_to_boot() {
        let runtime = create_test_runtime();
        runtime.set_active_loader(runtime.loader("app"));
        let object = runtime.use_class(OBJECT_CLASS_NAME).unwrap();
        assert!(object.loader().is_none());
    }

    #[test]
    fn test_use_class_reports_active_loader() {
        let runtime = create_test_runtime();
        runtime.set_active_loader(runtime.loader("plugin"));
        let err = runtime.use_class("com.example.Greeter").unwrap_err();
        match err {
            Error::ClassNotFound { loader, .. } => assert_eq!(loader.as_deref(), Some("plugin")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_call_routes_through_replacement() {
        let runtime = create_test_runtime();
        let method = greet(&runtime);
        let args = [Value::from("bob")];

        let original = runtime.call(&method, &Value::Null, &args).unwrap();
        assert_eq!(original, Value::from("hello bob"));

        runtime
            .replace_body(&method, Some(Arc::new(|_, _| Ok(Value::from("hooked")))))
            .unwrap();
        assert!(runtime.is_replaced(&method));
        assert_eq!(
            runtime.call(&method, &Value::Null, &args).unwrap(),
            Value::from("hooked")
        );

        runtime.replace_body(&method, None).unwrap();
        assert_eq!(runtime.call(&method, &Value::Null, &args).unwrap(), original);
    }

    #[test]
    fn test_stack_trace_during_call() {
        let runtime = Arc::new(create_test_runtime());
        let method = greet(&runtime);
        let inner = Arc::clone(&runtime);
        runtime
            .replace_body(
                &method,
                Some(Arc::new(move |_, _| {
                    let frames = inner.stack_trace()?;
                    Ok(Value::from(frames[0].method_name.as_str()))
                })),
            )
            .unwrap();

        let result = runtime.call(&method, &Value::Null, &[Value::from("x")]).unwrap();
        assert_eq!(result, Value::from("greet"));
        assert!(runtime.stack_trace().unwrap().is_empty());
    }

    #[test]
    fn test_render_failure() {
        let runtime = create_test_runtime();
        let good = runtime.new_object("com.example.Token", Rendering::Text("tok".into()));
        let bad = runtime.new_object("com.example.Broken", Rendering::Throws("boom".into()));
        assert_eq!(runtime.render(&good).unwrap(), "tok");
        assert!(runtime.render(&bad).is_err());
    }

    #[test]
    fn test_detached_thread_introspection_fails() {
        let runtime = crate::test::test_runtime_builder().detached().build();
        assert!(runtime.current_thread().is_err());
        assert!(runtime.stack_trace().is_err());

        let method = greet(&runtime);
        assert_eq!(
            runtime.call(&method, &Value::Null, &[Value::from("bob")]).unwrap(),
            Value::from("hello bob")
        );
    }
}
