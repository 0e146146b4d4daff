// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # hookscope
//!
//! A method interception engine for managed runtimes. `hookscope` gives instrumentation
//! scripts a small, validated API to locate classes and method overloads inside a running
//! runtime, replace method bodies while keeping the original reachable, and report every
//! intercepted call as a structured event.
//!
//! ## Features
//!
//! - **🔍 Multi-context class lookup** - Search every loading context, first success wins, first error is reported
//! - **🎯 Exact overload selection** - Pick one overload from a partial parameter signature
//! - **🪝 Call-through hooks** - Replacements always reach the original body, however often re-hooked
//! - **📡 Declarative capture** - Method, thread, arguments, result and stack as one JSON event per call
//! - **🧪 Emulated runtime** - A complete in-process runtime for tests and host-less experiments
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hookscope::prelude::*;
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(
//!     EmulatedRuntime::builder()
//!         .class(ClassDef::new("com.example.Greeter").in_loader("app").method(MethodDef::new(
//!             "greet",
//!             &["java.lang.String"],
//!             "java.lang.String",
//!             |_this, args| Ok(Value::Str(format!("hello {}", args[0]))),
//!         )))
//!         .build(),
//! );
//! let sink = Arc::new(MemorySink::new());
//! let agent = Agent::builder(runtime.clone()).sink(sink.clone()).build();
//!
//! // Report calls with their arguments
//! let capture = agent.event_replacement(CaptureOptions::default().with_args(true));
//! let method = agent.hook_method(
//!     "com.example.Greeter",
//!     "greet",
//!     Some(&["java.lang.String".into()][..]),
//!     Some(capture),
//! )?;
//!
//! runtime.call(&method, &Value::Null, &[Value::from("world")])?;
//! println!("{:?}", sink.events());
//! # Ok::<(), hookscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Components, leaf first:
//!
//! - [`runtime`] - The [`ManagedRuntime`] boundary, handles, [`Value`] and [`EmulatedRuntime`]
//! - [`resolve`] - Class and overload resolution
//! - [`describe`] - Qualified names and rendered signatures for method handles
//! - [`hook`] - Installation and removal of replacements with call-through
//! - [`capture`] - Replacements that record calls as [`CallEvent`]s
//! - [`introspect`] - Stack snapshots and argument renderings
//! - [`sink`], [`log`] - Outgoing records and leveled logging
//! - [`config`], [`script`] - Agent configuration and script ingestion
//!
//! [`Agent`] wires all of them together and is what scripts use.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use hookscope::{Agent, EmulatedRuntime, Error};
//! use std::sync::Arc;
//!
//! let agent = Agent::builder(Arc::new(EmulatedRuntime::builder().build())).build();
//! match agent.hook_method("com.example.Greeter", "greet", None, None) {
//!     Ok(method) => println!("Unhooked {method}"),
//!     Err(Error::ClassNotFound { name, .. }) => println!("No class {name}"),
//!     Err(Error::AmbiguousOverload { count, .. }) => println!("{count} overloads, pick one"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

mod agent;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use hookscope::prelude::*;
/// use std::sync::Arc;
///
/// let agent = Agent::builder(Arc::new(EmulatedRuntime::builder().build())).build();
/// let class = agent.find_class("java.lang.Object", None)?;
/// # Ok::<(), hookscope::Error>(())
/// ```
pub mod prelude;

pub mod capture;
pub mod config;
pub mod describe;
pub mod hook;
pub mod introspect;
pub mod log;
pub mod resolve;
pub mod runtime;
pub mod script;
pub mod sink;

/// `hookscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `hookscope` Error type
///
/// Every fallible operation of the crate reports one of its variants.
pub use error::Error;

pub use agent::{Agent, AgentBuilder, ClassTarget};
pub use capture::{CallEvent, CaptureFields, CaptureOptions, EventCapture, Normalized};
pub use config::AgentConfig;
pub use hook::{CallThrough, InterceptionBinding, Interceptor, Replacement};
pub use introspect::StackSnapshot;
pub use log::{Log, LogLevel};
pub use resolve::{ClassResolver, MethodResolver, MethodSelection, SignatureElement};
pub use runtime::{
    ClassDef, ClassHandle, EmulatedRuntime, LoaderRef, ManagedRuntime, MethodDef, MethodHandle,
    MethodOverloadSet, Rendering, Value,
};
pub use script::{Parameters, Script, ScriptEvaluator, ScriptLoader};
pub use sink::{EventSink, MemorySink, Message, WriterSink};
