use thiserror::Error;

macro_rules! runtime_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Runtime {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Runtime {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure is scoped to the operation that raised it; there is no process-fatal path.
/// Resolution errors carry enough context (class, method, loading context) to tell apart
/// failures coming from different loading contexts during a multi-context search.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::ClassNotFound`] - No class matches in the given (or any) loading context
/// - [`Error::OverloadNotFound`] - A signature was given but no overload matches exactly
/// - [`Error::AmbiguousOverload`] - A single method was requested but several overloads exist
/// - [`Error::EnumConstantNotFound`] - No enum constant renders to the requested name
///
/// ## Host Runtime Errors
/// - [`Error::UnsupportedMember`] - The reflection API rejected a member or a rewrite
/// - [`Error::Runtime`] - Any other failure raised by the host runtime
///
/// ## Configuration and Loading Errors
/// - [`Error::InvalidCaptureOption`] - A recognized capture flag had the wrong type
/// - [`Error::InvalidConfig`] - The agent configuration could not be read
/// - [`Error::ScriptLoad`] - A script failed to evaluate
/// - [`Error::ParametersFrozen`] - Script parameters were already published
///
/// # Examples
///
/// ```rust,no_run
/// use hookscope::{Agent, EmulatedRuntime, Error, MemorySink};
/// use std::sync::Arc;
///
/// let agent = Agent::builder(Arc::new(EmulatedRuntime::builder().build()))
///     .sink(Arc::new(MemorySink::new()))
///     .build();
///
/// match agent.find_class("com.example.Missing", None) {
///     Ok(class) => println!("Found {}", class.name()),
///     Err(Error::ClassNotFound { name, loader }) => {
///         eprintln!("{} not found (first failing context: {:?})", name, loader);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    /// No class with the requested name exists in the searched loading context.
    ///
    /// When several contexts were searched, this is the error raised by the *first*
    /// context in enumeration order, so `loader` names that context.
    #[error("Class not found - {name} (loader: {})", loader.as_deref().unwrap_or("<default>"))]
    ClassNotFound {
        /// The requested class name
        name: String,
        /// Display name of the loading context the lookup was pinned to, if any
        loader: Option<String>,
    },

    /// A parameter signature was supplied but no overload matches it exactly.
    #[error("No overload of {class}.{method} matches ({signature})")]
    OverloadNotFound {
        /// Qualified name of the class that was searched
        class: String,
        /// The requested method name
        method: String,
        /// The requested parameter types, comma separated
        signature: String,
    },

    /// A single overload was required but the name resolves to several.
    ///
    /// Supply an explicit signature, or hook every overload at once.
    #[error("{class}.{method} has {count} overloads, a signature is required")]
    AmbiguousOverload {
        /// Qualified name of the class that was searched
        class: String,
        /// The requested method name
        method: String,
        /// Number of candidate overloads
        count: usize,
    },

    /// No enum constant of the class renders to the requested name.
    #[error("Name of {name} does not match any constant of {class}")]
    EnumConstantNotFound {
        /// Qualified name of the enum class
        class: String,
        /// The requested constant name
        name: String,
    },

    // Host runtime errors
    /// The reflection API rejected a member or a dispatch rewrite.
    ///
    /// Raised for stale method handles and member kinds whose body cannot be replaced.
    #[error("Unsupported member - {0}")]
    UnsupportedMember(String),

    /// Failure raised by the host runtime.
    ///
    /// Covers exceptions thrown by original method bodies, failing textual renderings
    /// and any other host-side error. Includes the source location where it was raised.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the failure
    /// * `file` - Source file where the error was raised
    /// * `line` - Source line where the error was raised
    #[error("Runtime - {file}:{line}: {message}")]
    Runtime {
        /// The message describing the failure
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    // Configuration and loading errors
    /// A recognized capture option was supplied with an unusable value.
    #[error("Invalid capture option '{key}' - {reason}")]
    InvalidCaptureOption {
        /// The offending option key
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The agent configuration could not be deserialized.
    #[error("Invalid configuration - {0}")]
    InvalidConfig(String),

    /// A script failed to evaluate.
    ///
    /// Wraps the evaluator's failure and names the offending file.
    #[error("Unable to load {filename}: {message}")]
    ScriptLoad {
        /// The script's file name
        filename: String,
        /// The evaluator's failure description
        message: String,
    },

    /// The script parameter mapping was already published and is read-only.
    #[error("Script parameters are already defined")]
    ParametersFrozen,
}
