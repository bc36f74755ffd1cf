//! Progress reporting for the feature pipeline.
//!
//! The pipeline is a synchronous, single-pass transform with no cancellation;
//! progress updates exist so front ends can surface what stage a large batch
//! is in.
//!
//! # Example
//!
//! ```rust,ignore
//! use churn_features::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(table)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the feature pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Pipeline is starting
    Initializing,
    /// Column labels rewritten to key form
    KeyNormalization,
    /// Keys mapped onto canonical names
    AliasResolution,
    /// Cell values normalized per feature
    ValueCoercion,
    /// Negative rejection and median fill (pass 1)
    Imputation,
    /// Identifier sort and churn-label cleaning
    RowFiltering,
    /// Senior citizen, phone and service aggregates
    FeatureDerivation,
    /// Selection of the model schema
    Projection,
    /// Residual median/mode fill (pass 2)
    FinalImputation,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::KeyNormalization => "Normalizing Column Keys",
            Self::AliasResolution => "Resolving Aliases",
            Self::ValueCoercion => "Coercing Values",
            Self::Imputation => "Imputing Values",
            Self::RowFiltering => "Filtering Rows",
            Self::FeatureDerivation => "Deriving Features",
            Self::Projection => "Projecting Schema",
            Self::FinalImputation => "Final Imputation",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of total work attributed to this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::KeyNormalization => 0.05,
            Self::AliasResolution => 0.10,
            Self::ValueCoercion => 0.20,
            Self::Imputation => 0.15,
            Self::RowFiltering => 0.10,
            Self::FeatureDerivation => 0.15,
            Self::Projection => 0.05,
            Self::FinalImputation => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::KeyNormalization => 0.05,
            Self::AliasResolution => 0.10,
            Self::ValueCoercion => 0.20,
            Self::Imputation => 0.40,
            Self::RowFiltering => 0.55,
            Self::FeatureDerivation => 0.65,
            Self::Projection => 0.80,
            Self::FinalImputation => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the end of this stage; equal to the start of
    /// the next one, so boundaries never move backwards.
    pub fn end_progress(&self) -> f32 {
        match self {
            Self::Initializing => Self::KeyNormalization.base_progress(),
            Self::KeyNormalization => Self::AliasResolution.base_progress(),
            Self::AliasResolution => Self::ValueCoercion.base_progress(),
            Self::ValueCoercion => Self::Imputation.base_progress(),
            Self::Imputation => Self::RowFiltering.base_progress(),
            Self::RowFiltering => Self::FeatureDerivation.base_progress(),
            Self::FeatureDerivation => Self::Projection.base_progress(),
            Self::Projection => Self::FinalImputation.base_progress(),
            Self::FinalImputation | Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = if stage_progress >= 1.0 {
            stage.end_progress()
        } else {
            (stage.base_progress() + stage.weight() * stage_progress)
                .clamp(stage.base_progress(), stage.end_progress())
        };
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates during processing.
///
/// Implementations must be `Send + Sync` so a pipeline can run on a worker
/// thread while reporting to another.
pub trait ProgressReporter: Send + Sync {
    /// Called once at the start and end of every stage.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
