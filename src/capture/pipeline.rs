//! Capturing replacement.

use std::{fmt, sync::Arc};

use crate::{
    capture::{normalize, normalize_all, CallEvent, CaptureFields, CaptureOptions},
    hook::{CallThrough, Replacement},
    introspect::capture_stack,
    log::Log,
    runtime::{ManagedRuntime, MethodHandle, Value},
    sink::{EventSink, Message},
    Result,
};

/// Builds replacements that call through and report each call as a [`CallEvent`].
///
/// The original body always runs first and its outcome is returned untouched: a
/// result is passed back as is, a failure propagates without an event being sent.
/// Thread and stack lookups that fail are logged at debug level and leave their
/// fields out; object renderings that fail become absent values.
///
/// # Examples
///
/// ```rust,ignore
/// let capture = EventCapture::new(
///     CaptureOptions::default().with_thread(true).with_args(true),
///     sink.clone(),
///     log.clone(),
/// );
/// interceptor.install(&method, Some(capture.into_replacement()))?;
/// ```
pub struct EventCapture {
    options: CaptureOptions,
    sink: Arc<dyn EventSink>,
    log: Arc<Log>,
}

impl EventCapture {
    /// Creates a capture with the given options.
    pub fn new(options: CaptureOptions, sink: Arc<dyn EventSink>, log: Arc<Log>) -> Self {
        EventCapture { options, sink, log }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Calls through, sends the event and returns the original result.
    ///
    /// # Errors
    ///
    /// Propagates the original body's failure.
    pub fn intercept(&self, original: &CallThrough, this: &Value, args: &[Value]) -> Result<Value> {
        let result = original.call(this, args)?;
        let runtime = original.runtime()?;
        let event = self.record(runtime.as_ref(), original.method(), this, args, &result);
        self.sink.send(Message::Event(event));
        Ok(result)
    }

    /// Assembles the event for one completed call.
    pub fn record(
        &self,
        runtime: &dyn ManagedRuntime,
        method: &MethodHandle,
        this: &Value,
        args: &[Value],
        result: &Value,
    ) -> CallEvent {
        let mut event = CallEvent::with_extras(self.options.extras());

        if self.options.captures(CaptureFields::METHOD) {
            let class_name = this.class_name().unwrap_or(method.class_name());
            event.insert(CallEvent::CLASS_NAME, class_name);
            event.insert(CallEvent::METHOD_NAME, method.signature());
            event.insert(CallEvent::METHOD_SIMPLE_NAME, method.name());
        }

        if self.options.captures(CaptureFields::THREAD) {
            let thread = self
                .log
                .ignore_error(|| runtime.current_thread().map(Some), None);
            if let Some(thread) = thread {
                event.insert(CallEvent::THREAD_ID, thread.id);
                event.insert(CallEvent::THREAD_NAME, thread.name);
            }
        }

        if self.options.captures(CaptureFields::ARGS) {
            event.insert_normalized(CallEvent::ARGS, &normalize_all(args, runtime));
            event.insert_normalized(CallEvent::RESULT, &normalize(result, runtime));
        }

        if self.options.captures(CaptureFields::STACK) {
            let stack = self
                .log
                .ignore_error(|| capture_stack(runtime).map(Some), None);
            if let Some(stack) = stack {
                event.insert_normalized(CallEvent::STACK, &stack.to_normalized());
            }
        }

        event
    }

    /// Turns the capture into a [`Replacement`].
    #[must_use]
    pub fn into_replacement(self) -> Replacement {
        Arc::new(move |original, this, args| self.intercept(original, this, args))
    }
}

impl fmt::Debug for EventCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCapture")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
