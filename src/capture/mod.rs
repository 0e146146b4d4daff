//! Event capture pipeline.
//!
//! Builds replacements that delegate to the original method and emit one structured
//! [`CallEvent`] per call, with the fields selected by a [`CaptureOptions`]:
//!
//! | Flag | Event fields |
//! |------|--------------|
//! | `method` (default) | `class_name`, `method_name`, `method_simple_name` |
//! | `thread` | `thread_id`, `thread_name` |
//! | `args` | `args`, `result` |
//! | `stack` | `stack` |
//!
//! Extra option keys are copied verbatim into every event. Values are reduced to plain
//! data through [`normalize`], which never fails.

mod event;
mod normalize;
mod options;
mod pipeline;

pub use event::CallEvent;
pub use normalize::{normalize, normalize_all, Normalized};
pub use options::{CaptureFields, CaptureOptions};
pub use pipeline::EventCapture;
