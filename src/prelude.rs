//! # hookscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! of the library. Import it to get quick access to everything a hooking script needs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all hookscope operations
pub use crate::Error;

/// The result type used throughout hookscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Scripting facade and its builder
pub use crate::{Agent, AgentBuilder, AgentConfig, ClassTarget};

// ================================================================================================
// Host Runtime
// ================================================================================================

/// Runtime boundary and handles
pub use crate::runtime::{
    ClassHandle, LoaderRef, ManagedRuntime, MethodHandle, MethodOverloadSet, StackFrame,
    ThreadInfo, Value,
};

/// In-process runtime
pub use crate::runtime::{ClassDef, EmulatedRuntime, MethodDef, Rendering};

// ================================================================================================
// Interception and Capture
// ================================================================================================

/// Hooking
pub use crate::hook::{replacement, CallThrough, Replacement};

/// Resolution
pub use crate::resolve::SignatureElement;

/// Event capture
pub use crate::capture::{CallEvent, CaptureFields, CaptureOptions};

// ================================================================================================
// Output
// ================================================================================================

/// Sinks and logging
pub use crate::{
    log::LogLevel,
    sink::{EventSink, MemorySink, Message, WriterSink},
};
