//! Shared fixtures for unit tests.
//!
//! The fixture runtime models a small application:
//!
//! | Class | Loader | Notes |
//! |-------|--------|-------|
//! | `java.lang.Object` | boot | `toString()`, `hashCode()` |
//! | `com.example.Greeter` | app | constructor, three `greet` overloads, `flag`, `equals`, `secret()` |
//! | `com.example.LoudGreeter` | app | extends `Greeter`, overrides `greet(String)`, adds `shout` |
//! | `com.example.Vault` | app | `sealed()` cannot be rewritten, `explode()` always fails |
//! | `com.example.Color` | app | enum `RED`, `GREEN`, `BLUE` |
//! | `com.example.plugin.Widget` | plugin | `ping()` |

use std::sync::Arc;

use crate::{
    log::LogLevel,
    runtime::{
        ClassDef, EmulatedRuntime, EmulatedRuntimeBuilder, ManagedRuntime, MethodDef,
        MethodHandle, Value,
    },
    sink::MemorySink,
    Agent, AgentConfig,
};

fn text(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string())
}

pub(crate) fn create_test_runtime() -> EmulatedRuntime {
    test_runtime_builder().build()
}

/// Returns the fixture classes, unbuilt, for tests that tweak the runtime.
pub(crate) fn test_runtime_builder() -> EmulatedRuntimeBuilder {
    EmulatedRuntime::builder()
        .version(30)
        .loader("app")
        .loader("plugin")
        .class(
            ClassDef::new("java.lang.Object")
                .method(MethodDef::new("toString", &[], "java.lang.String", |this, _| {
                    Ok(Value::from(this.to_string()))
                }))
                .method(MethodDef::new("hashCode", &[], "int", |_, _| Ok(Value::Int(0)))),
        )
        .class(
            ClassDef::new("com.example.Greeter")
                .in_loader("app")
                .method(MethodDef::constructor(&[], |_, _| Ok(Value::Void)))
                .method(MethodDef::new("greet", &[], "java.lang.String", |_, _| {
                    Ok(Value::from("hello"))
                }))
                .method(MethodDef::new(
                    "greet",
                    &["java.lang.String"],
                    "java.lang.String",
                    |_, args| Ok(Value::from(format!("hello {}", text(&args[0])))),
                ))
                .method(MethodDef::new(
                    "greet",
                    &["java.lang.String", "int"],
                    "java.lang.String",
                    |_, args| {
                        let times = usize::try_from(args[1].as_i64().unwrap_or(1)).unwrap_or(1);
                        Ok(Value::from(format!("hello {}", text(&args[0])).repeat(times)))
                    },
                ))
                .method(MethodDef::new(
                    "flag",
                    &["int", "java.lang.String"],
                    "boolean",
                    |_, _| Ok(Value::Bool(true)),
                ))
                .method(MethodDef::new(
                    "equals",
                    &["com.example.Greeter"],
                    "boolean",
                    |this, args| Ok(Value::Bool(*this == args[0])),
                ))
                .method(
                    MethodDef::new("secret", &[], "java.lang.Object", |_, _| {
                        Ok(Value::from("s"))
                    })
                    .undescribed(),
                ),
        )
        .class(
            ClassDef::new("com.example.LoudGreeter")
                .in_loader("app")
                .extends("com.example.Greeter")
                .method(MethodDef::new(
                    "greet",
                    &["java.lang.String"],
                    "java.lang.String",
                    |_, args| Ok(Value::from(format!("HELLO {}", text(&args[0])))),
                ))
                .method(MethodDef::new(
                    "shout",
                    &["java.lang.String"],
                    "java.lang.String",
                    |_, args| Ok(Value::from(text(&args[0]).to_uppercase())),
                )),
        )
        .class(
            ClassDef::new("com.example.Vault")
                .in_loader("app")
                .method(
                    MethodDef::new("sealed", &[], "void", |_, _| Ok(Value::Void)).not_rewritable(),
                )
                .method(MethodDef::new("explode", &[], "void", |_, _| {
                    Err(runtime_error!("java.lang.IllegalStateException: boom"))
                })),
        )
        .class(
            ClassDef::new("com.example.Color")
                .in_loader("app")
                .enum_constant("RED")
                .enum_constant("GREEN")
                .enum_constant("BLUE"),
        )
        .class(
            ClassDef::new("com.example.plugin.Widget")
                .in_loader("plugin")
                .method(MethodDef::new("ping", &[], "java.lang.String", |_, _| {
                    Ok(Value::from("pong"))
                })),
        )
}

pub(crate) fn create_test_agent() -> (Agent, Arc<EmulatedRuntime>, Arc<MemorySink>) {
    let runtime = Arc::new(create_test_runtime());
    let sink = Arc::new(MemorySink::new());
    let agent = Agent::builder(runtime.clone())
        .sink(sink.clone())
        .config(AgentConfig::default().with_log_level(LogLevel::Info))
        .build();
    (agent, runtime, sink)
}

/// Resolves an overload of an `app` class directly through the runtime.
pub(crate) fn app_method(
    runtime: &EmulatedRuntime,
    class: &str,
    name: &str,
    params: &[&str],
) -> MethodHandle {
    runtime.set_active_loader(runtime.loader("app"));
    let class = runtime.use_class(class).unwrap();
    runtime.set_active_loader(None);

    let member = runtime
        .members(&class, name)
        .unwrap()
        .into_iter()
        .find(|m| m.params.iter().map(|p| p.as_str()).eq(params.iter().copied()))
        .unwrap();
    MethodHandle::from_member(name, member)
}

pub(crate) fn greet_method(runtime: &EmulatedRuntime) -> MethodHandle {
    app_method(runtime, "com.example.Greeter", "greet", &["java.lang.String"])
}

pub(crate) fn flag_method(runtime: &EmulatedRuntime) -> MethodHandle {
    app_method(runtime, "com.example.Greeter", "flag", &["int", "java.lang.String"])
}

pub(crate) fn sealed_method(runtime: &EmulatedRuntime) -> MethodHandle {
    app_method(runtime, "com.example.Vault", "sealed", &[])
}

pub(crate) fn failing_method(runtime: &EmulatedRuntime) -> MethodHandle {
    app_method(runtime, "com.example.Vault", "explode", &[])
}
