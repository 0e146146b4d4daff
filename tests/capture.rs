//! Integration tests for the event capture pipeline and call introspection.

use std::sync::Arc;

use hookscope::{introspect, prelude::*};
use serde_json::json;

fn runtime() -> Arc<EmulatedRuntime> {
    Arc::new(
        EmulatedRuntime::builder()
            .loader("app")
            .class(
                ClassDef::new("com.example.Session")
                    .in_loader("app")
                    .method(MethodDef::new(
                        "check",
                        &["int", "java.lang.String"],
                        "boolean",
                        |_, _| Ok(Value::Bool(true)),
                    ))
                    .method(MethodDef::new("tokens", &["java.lang.Object[]"], "void", |_, _| {
                        Ok(Value::Void)
                    }))
                    .method(MethodDef::new("outer", &[], "int", |_, _| Ok(Value::Int(1))))
                    .method(MethodDef::new("inner", &[], "int", |_, _| Ok(Value::Int(2)))),
            )
            .class(
                ClassDef::new("com.example.Bare")
                    .in_loader("app")
                    .without_wrapper_name()
                    .method(MethodDef::new("ping", &[], "int", |_, _| Ok(Value::Int(7)))),
            )
            .build(),
    )
}

fn agent(runtime: &Arc<EmulatedRuntime>, sink: Arc<dyn EventSink>) -> Agent {
    Agent::builder(runtime.clone()).sink(sink).build()
}

#[test]
fn test_capture_fidelity() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    let options = CaptureOptions::from_json(&json!({
        "method": true,
        "thread": true,
        "args": true,
        "stack": false,
    }))?;
    let method = agent.hook_method(
        "com.example.Session",
        "check",
        None,
        Some(agent.event_replacement(options)),
    )?;

    let this = Value::Object(
        runtime.new_object("com.example.Session", Rendering::Text("session".into())),
    );
    let result = runtime.call(&method, &this, &[Value::Int(1), Value::from("x")])?;
    assert_eq!(result, Value::Bool(true));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    for field in [
        CallEvent::CLASS_NAME,
        CallEvent::METHOD_NAME,
        CallEvent::METHOD_SIMPLE_NAME,
        CallEvent::THREAD_ID,
        CallEvent::THREAD_NAME,
    ] {
        assert!(event.contains(field), "missing {field}");
    }
    assert_eq!(event.get(CallEvent::ARGS), Some(&json!([1, "x"])));
    assert_eq!(event.get(CallEvent::RESULT), Some(&json!(true)));
    assert!(!event.contains(CallEvent::STACK));
    Ok(())
}

#[test]
fn test_extras_are_copied_into_every_event() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    let options =
        CaptureOptions::from_json(&json!({"method": false, "session": "abc", "n": 2}))?;
    let method = agent.hook_method(
        "com.example.Session",
        "outer",
        None,
        Some(agent.event_replacement(options)),
    )?;
    for _ in 0..2 {
        runtime.call(&method, &Value::Null, &[])?;
    }

    for event in sink.events() {
        assert_eq!(
            event.fields(),
            json!({"session": "abc", "n": 2}).as_object().expect("object")
        );
    }
    Ok(())
}

#[test]
fn test_normalization_never_fails() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    let options = CaptureOptions::default().with_args(true);
    let method = agent.hook_method(
        "com.example.Session",
        "tokens",
        None,
        Some(agent.event_replacement(options)),
    )?;

    let good = runtime.new_object("com.example.Token", Rendering::Text("tok".into()));
    let bad = runtime.new_object(
        "com.example.Token",
        Rendering::Throws("NullPointerException".into()),
    );
    let args = [Value::Array(vec![Value::Object(good), Value::Object(bad.clone())])];

    assert_eq!(runtime.call(&method, &Value::Null, &args)?, Value::Void);

    let event = &sink.events()[0];
    assert_eq!(event.get(CallEvent::ARGS), Some(&json!([["tok", null]])));
    assert!(!event.contains(CallEvent::RESULT));

    let text = introspect::render_arguments(&[Value::Object(bad)], None, runtime.as_ref());
    assert_eq!(text, "Arguments: \n    Arguments[0]: undefined");
    Ok(())
}

#[test]
fn test_stack_capture_sees_nested_calls() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    let inner = agent.hook_method(
        "com.example.Session",
        "inner",
        None,
        Some(agent.event_replacement(CaptureOptions::new(CaptureFields::STACK))),
    )?;

    let nested_runtime = runtime.clone();
    let nested = inner.clone();
    agent.hook_method(
        "com.example.Session",
        "outer",
        None,
        Some(replacement(move |_, this, _| nested_runtime.call(&nested, this, &[]))),
    )?;

    let outer = agent.find_method("com.example.Session", "outer", &[])?;
    assert_eq!(runtime.call(&outer, &Value::Null, &[])?, Value::Int(2));

    let stack = sink.events()[0]
        .get(CallEvent::STACK)
        .and_then(|s| s.as_array().cloned())
        .expect("stack field");
    let frames: Vec<&str> = stack.iter().filter_map(|f| f.as_str()).collect();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("inner"));
    assert!(frames[1].contains("outer"));
    Ok(())
}

#[test]
fn test_print_helpers_log_structured_messages() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    agent.print_stack()?;
    agent.print_arguments(&[Value::Int(1), Value::from("x")], Some(&Value::Bool(true)));

    let logs = sink.logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, json!({"stack": "Stack: "}));
    let arguments = "Arguments: \n    Arguments[0]: 1\n    Arguments[1]: x\n    Return: true";
    assert_eq!(logs[1].message, json!({ "arguments": arguments }));
    Ok(())
}

#[test]
fn test_class_name_falls_back_without_wrapper() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(MemorySink::new());
    let agent = agent(&runtime, sink.clone());

    let class = agent.find_class("com.example.Bare", None)?;
    assert_eq!(class.wrapper_name(), None);

    let method = agent.hook_method(
        class.clone(),
        "ping",
        None,
        Some(agent.event_replacement(CaptureOptions::default())),
    )?;
    assert_eq!(runtime.call(&method, &Value::Null, &[])?, Value::Int(7));
    assert_eq!(runtime.call(&method, &Value::Class(class), &[])?, Value::Int(7));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    for event in &events {
        assert_eq!(event.get(CallEvent::CLASS_NAME), Some(&json!("com.example.Bare")));
        assert_eq!(
            event.get(CallEvent::METHOD_NAME),
            Some(&json!("int com.example.Bare.ping()"))
        );
    }
    Ok(())
}

#[test]
fn test_writer_sink_emits_ndjson() -> Result<()> {
    let runtime = runtime();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let agent = agent(&runtime, sink.clone());

    let method = agent.hook_method(
        "com.example.Session",
        "outer",
        None,
        Some(agent.event_replacement(CaptureOptions::default())),
    )?;
    runtime.call(&method, &Value::Null, &[])?;

    // The installed replacement lives in the runtime and shares the sink.
    drop(agent);
    drop(runtime);

    let sink = Arc::try_unwrap(sink).ok().expect("sole owner of the sink");
    let output = String::from_utf8(sink.into_inner()).expect("utf-8 output");
    let records: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    assert_eq!(records.len(), 2);
    assert!(records[0]["log"]["message"]
        .as_str()
        .is_some_and(|m| m.starts_with("Hook method: ")));
    assert_eq!(records[1]["event"]["method_simple_name"], "outer");
    assert_eq!(
        records[1]["event"]["method_name"],
        "int com.example.Session.outer()"
    );
    Ok(())
}
