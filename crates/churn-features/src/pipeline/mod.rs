//! Pipeline module.
//!
//! This module provides the main feature pipeline, the schema projector and
//! progress reporting.

mod builder;
mod projector;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
pub use projector::{Projection, SchemaProjector};
