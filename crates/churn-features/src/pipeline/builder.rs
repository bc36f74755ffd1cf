//! Main feature pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! running the schema-normalization and feature-engineering stages.

use crate::cleaner::{AliasResolver, KeyNormalizer, RowStages, ValueCoercer};
use crate::config::{ConfigValidationError, FeatureContract};
use crate::derived::DerivedFeatureBuilder;
use crate::error::Result;
use crate::imputers::MissingValueImputer;
use crate::ingest;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::projector::SchemaProjector;
use crate::schema::CHURN;
use crate::types::{PipelineResult, PipelineSummary, RawTable};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The feature pipeline.
///
/// A pipeline holds an immutable [`FeatureContract`] and is reusable across
/// batches; no state is carried from one call to the next.
///
/// # Example
///
/// ```rust,ignore
/// use churn_features::{Pipeline, FeatureContract, RawTable};
///
/// let table = RawTable::from_json_str(r#"{"Sex": "Male", "Tenure": 12}"#)?;
/// let result = Pipeline::builder()
///     .contract(FeatureContract::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(table)?;
///
/// println!("{:?}", result.batch.rows()[0]);
/// ```
pub struct Pipeline {
    contract: Arc<FeatureContract>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    normalizer: KeyNormalizer,
    resolver: AliasResolver,
    coercer: ValueCoercer,
    imputer: MissingValueImputer,
    rows: RowStages,
    deriver: DerivedFeatureBuilder,
    projector: SchemaProjector,
}

// Independent batches may be processed on worker threads
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The contract this pipeline applies.
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Run every stage over `table` and extract the feature batch.
    ///
    /// Ambiguous values never fail the run; they are resolved with defaults
    /// and counted in the returned summary.
    pub fn process(&self, table: RawTable) -> Result<PipelineResult> {
        match self.process_internal(table) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Load a CSV or JSON file and process it.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let table = ingest::load_table(path)?;
        self.process(table)
    }

    /// Parse a JSON object or array of objects and process it.
    pub fn process_json(&self, input: &str) -> Result<PipelineResult> {
        let table = RawTable::from_json_str(input)?;
        self.process(table)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage_started(&self, stage: PipelineStage, message: &str) {
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn stage_finished(&self, stage: PipelineStage, message: &str) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn process_internal(&self, table: RawTable) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let contract = self.contract.as_ref();

        info!("Starting feature pipeline...");
        self.stage_started(PipelineStage::Initializing, "Starting feature pipeline...");

        let mut summary = PipelineSummary::new();
        summary.rows_before = table.height();
        summary.columns_before = table.width();

        // Step 1: Column key normalization
        self.stage_started(PipelineStage::KeyNormalization, "Normalizing column keys...");
        info!("Step 1: Normalizing column keys...");
        let (table, collisions) = self.normalizer.normalize_table(table);
        for key in collisions {
            summary.add_warning(format!("Columns collided on key '{key}', last one kept"));
        }
        self.stage_finished(PipelineStage::KeyNormalization, "Column keys normalized");

        // Step 2: Alias resolution
        self.stage_started(PipelineStage::AliasResolution, "Resolving aliases...");
        info!("Step 2: Resolving aliases...");
        let (table, resolution) = self.resolver.resolve(table, contract);
        for key in &resolution.shadowed {
            summary.add_warning(format!("Column '{key}' ignored, another alias was matched first"));
        }
        summary.renames = resolution.renames;
        summary.labeled = table.contains(CHURN);
        self.stage_finished(PipelineStage::AliasResolution, "Aliases resolved");

        // Step 3: Value coercion
        self.stage_started(PipelineStage::ValueCoercion, "Coercing values...");
        info!("Step 3: Coercing values...");
        let (mut table, coercion) = self.coercer.coerce(table, contract);
        summary.ambiguous_values += coercion.ambiguous;
        summary.cells_imputed += coercion.contract_filled;
        self.stage_finished(PipelineStage::ValueCoercion, "Values coerced");

        // Step 4: Negative rejection and median fill
        self.stage_started(PipelineStage::Imputation, "Imputing numeric columns...");
        info!("Step 4: Imputing numeric columns (pass 1)...");
        let first = self.imputer.first_pass(&mut table, contract);
        summary.negatives_rejected += first.negatives_rejected;
        summary.cells_imputed += first.cells_imputed;
        debug!("Pass 1 steps: {:?}", first.steps);
        self.stage_finished(PipelineStage::Imputation, "Numeric columns imputed");

        // Step 5: Row stages
        self.stage_started(PipelineStage::RowFiltering, "Sorting and filtering rows...");
        info!("Step 5: Sorting by identifier and cleaning churn labels...");
        let table = match self.rows.sort_by_id(&table, contract) {
            Some(outcome) => {
                summary.sorted_by_id = true;
                outcome.table
            }
            None => table,
        };
        let mut table = match self.rows.clean_churn_labels(&table, contract)? {
            Some(outcome) => {
                summary.rows_dropped += outcome.dropped;
                outcome.table
            }
            None => table,
        };
        self.stage_finished(PipelineStage::RowFiltering, "Rows filtered");

        // Step 6: Derived features
        self.stage_started(PipelineStage::FeatureDerivation, "Deriving features...");
        info!("Step 6: Deriving features...");
        summary.derived_features = self.deriver.derive(&mut table, contract)?;
        self.stage_finished(PipelineStage::FeatureDerivation, "Features derived");

        // Step 7: Projection
        self.stage_started(PipelineStage::Projection, "Projecting model schema...");
        info!("Step 7: Projecting model schema...");
        let projection = self.projector.project(table, contract, summary.labeled);
        summary.defaulted_features = projection.defaulted;
        summary.dropped_columns = projection.dropped;
        let mut table = projection.table;
        self.stage_finished(PipelineStage::Projection, "Model schema projected");

        // Step 8: Final imputation
        self.stage_started(PipelineStage::FinalImputation, "Final imputation...");
        info!("Step 8: Final imputation (pass 2)...");
        let second = self.imputer.final_pass(&mut table);
        summary.cells_imputed += second.cells_imputed;
        summary.ambiguous_values += second.unparseable;
        debug!("Pass 2 steps: {:?}", second.steps);

        let (batch, fallbacks) = self.projector.extract_batch(&table)?;
        summary.ambiguous_values += fallbacks;
        self.stage_finished(PipelineStage::FinalImputation, "Final imputation complete");

        summary.rows_after = batch.len();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline complete: {} rows in, {} rows out, {} features ({} ms)",
            summary.rows_before,
            summary.rows_after,
            batch.feature_names().len(),
            summary.duration_ms
        );

        Ok(PipelineResult { batch, summary })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    contract: Option<Arc<FeatureContract>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the feature contract.
    pub fn contract(mut self, contract: FeatureContract) -> Self {
        self.contract = Some(Arc::new(contract));
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the contract is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let contract = self.contract.unwrap_or_default();
        contract.validate()?;

        Ok(Pipeline {
            contract,
            progress_reporter: self.progress_reporter,
            normalizer: KeyNormalizer,
            resolver: AliasResolver,
            coercer: ValueCoercer,
            imputer: MissingValueImputer,
            rows: RowStages,
            deriver: DerivedFeatureBuilder,
            projector: SchemaProjector,
        })
    }
}
