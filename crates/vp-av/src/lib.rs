//! vp-av: external tool layer for probing and transcoding.
//!
//! Wraps the ffmpeg/ffprobe CLIs behind a command builder with streaming
//! output, a probe adapter, a pure encode planner, and a debounced progress
//! tracker.

pub mod command;
pub mod encode;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod tools;

pub use command::{StreamingChild, ToolCommand, ToolOutput};
pub use encode::run_encode;
pub use plan::EncodePlan;
pub use probe::{probe_file, ProbeReport};
pub use progress::ProgressTracker;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
