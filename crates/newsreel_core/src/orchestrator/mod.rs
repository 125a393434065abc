//! Pipeline orchestration.

pub mod errors;
mod pipeline;

pub use errors::{PipelineError, StageError};
pub use pipeline::Orchestrator;
