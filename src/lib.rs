//! Quill: a statically bound scripting language for game event scripts.
//!
//! The compiler itself lives in the workspace crates; this crate bundles
//! the standard host library, the file pipeline used by the CLI and
//! diagnostic rendering.

pub mod diagnostics;
pub mod host;
pub mod pipeline;

pub use host::{HostError, standard_runtime};
pub use pipeline::{CheckReport, PipelineError, check_file, load_options};
