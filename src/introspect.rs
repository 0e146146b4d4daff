//! Call stack snapshots and human-readable call renderings.
//!
//! Stacks are captured eagerly: [`capture_stack`] reads every frame of a freshly
//! materialized throwable into a [`StackSnapshot`], so later changes to the thread's
//! stack do not affect it.

use crate::{
    capture::{normalize, Normalized},
    runtime::{ManagedRuntime, StackFrame, Value},
    Result,
};

/// Finite, eagerly captured sequence of stack frames, innermost first.
///
/// Consuming iteration yields each frame once; a snapshot cannot be restarted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackSnapshot {
    frames: Vec<StackFrame>,
}

impl StackSnapshot {
    /// Wraps already captured frames.
    #[must_use]
    pub fn new(frames: Vec<StackFrame>) -> Self {
        StackSnapshot { frames }
    }

    /// Returns the frames.
    #[must_use]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the frames as a normalized list of their textual forms.
    #[must_use]
    pub fn to_normalized(&self) -> Normalized {
        Normalized::List(
            self.frames
                .iter()
                .map(|f| Normalized::Str(f.text.clone()))
                .collect(),
        )
    }
}

impl IntoIterator for StackSnapshot {
    type Item = StackFrame;
    type IntoIter = std::vec::IntoIter<StackFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

/// Captures the calling thread's stack.
///
/// # Errors
///
/// Propagates the runtime's failure to materialize a throwable.
pub fn capture_stack(runtime: &dyn ManagedRuntime) -> Result<StackSnapshot> {
    runtime.stack_trace().map(StackSnapshot::new)
}

/// Renders frames as `Stack: ` followed by one indexed line per frame.
///
/// ```text
/// Stack:
///     [0] at com.example.Greeter.greet(Greeter.java:12)
///     [1] at com.example.Main.main(Main.java:3)
/// ```
#[must_use]
pub fn render_stack(frames: &[StackFrame]) -> String {
    let mut body = String::from("Stack: ");
    for (index, frame) in frames.iter().enumerate() {
        body.push_str(&format!("\n    [{index}] at {frame}"));
    }
    body
}

/// Renders arguments, and the return value if given, one indexed line each.
///
/// Values go through [`pretty_string`], so failing renderings show up as
/// `undefined` instead of raising.
///
/// ```text
/// Arguments:
///     Arguments[0]: 1
///     Arguments[1]: x
///     Return: true
/// ```
#[must_use]
pub fn render_arguments(
    args: &[Value],
    result: Option<&Value>,
    runtime: &dyn ManagedRuntime,
) -> String {
    let mut body = String::from("Arguments: ");
    for (index, arg) in args.iter().enumerate() {
        body.push_str(&format!(
            "\n    Arguments[{index}]: {}",
            pretty_string(arg, runtime)
        ));
    }
    if let Some(result) = result {
        body.push_str(&format!("\n    Return: {}", pretty_string(result, runtime)));
    }
    body
}

/// Normalizes `value` and renders it as text; arrays become JSON text.
#[must_use]
pub fn pretty_string(value: &Value, runtime: &dyn ManagedRuntime) -> String {
    normalize(value, runtime).to_string()
}
