//! churn-scoring: classifier contracts and response assembly for churn
//! feature batches.
//!
//! This crate consumes the [`FeatureBatch`](churn_features::FeatureBatch)es
//! produced by `churn-features` and turns them into scored responses.
//!
//! # Features
//!
//! - **Collaborator Contracts**: [`Classifier`] and [`Explainer`] traits over model-schema vectors
//! - **Reference Model**: [`LinearModel`], a logistic scorer with fixed coefficients loaded from JSON
//! - **Response Assembly**: label, probability rounded to 4 places, attribution map
//! - **Risk Tiers**: high above 0.7, medium above 0.4, low otherwise
//! - **Batch Summaries**: churn rate, average probability, risk distribution
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use churn_features::Pipeline;
//! use churn_scoring::{BatchSummary, LinearModel, Scorer, ScoringConfig};
//!
//! let result = Pipeline::builder().build()?.process_file("customers.csv")?;
//!
//! let scorer = Scorer::from_linear(LinearModel::load("model.json")?, ScoringConfig::default());
//! let records = scorer.score_batch(&result.batch)?;
//!
//! let summary = BatchSummary::from_records(&records);
//! println!("Churn rate: {:.1}%", summary.churn_rate);
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ScoringError>`]:
//!
//! - [`ScoringError::ModelNotFound`] - Model file does not exist
//! - [`ScoringError::InvalidModel`] - Model values failed validation
//! - [`ScoringError::FeatureMismatch`] - Batch lacks features the model reads
//!
//! See [`ScoringError`] for the complete list.

mod config;
mod error;
mod model;
mod scorer;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{ScoringConfig, ScoringConfigBuilder};
// Error types
pub use error::ScoringError;
// Model contracts and the reference model
pub use model::{Classifier, Explainer, LinearModel};
// Scoring
pub use scorer::Scorer;
// Result types
pub use types::{BatchSummary, RiskDistribution, RiskLevel, ScoredRecord};
