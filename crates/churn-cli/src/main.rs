//! CLI entry point for the churn feature pipeline.

use anyhow::{Result, anyhow};
use churn_features::cleaner::{AliasResolver, KeyNormalizer};
use churn_features::{
    ComprehensiveReport, FeatureContract, Pipeline, PipelineResult, RawTable, ReportGenerator,
    ingest,
};
use churn_scoring::{BatchSummary, LinearModel, RiskLevel, Scorer, ScoringConfig};
use clap::Parser;
use dotenv::dotenv;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Churn schema normalization and feature engineering",
    long_about = "Maps customer records of arbitrary schema onto the churn model's feature \
                  contract, optionally scores them, and writes the feature matrix as CSV.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CHURN_CONTRACT    Path to a feature contract JSON file\n  \
                  RUST_LOG          Overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Build features for a CSV export\n  \
                  churn-features -i customers.csv -o results/\n\n  \
                  # Score a single record\n  \
                  churn-features --record '{\"Sex\": \"Male\", \"Tenure\": 12}' --model model.json\n\n  \
                  # Preview column mapping without processing\n  \
                  churn-features -i customers.csv --dry-run"
)]
struct Args {
    /// Path to the CSV or JSON file to process
    #[arg(short, long, required_unless_present = "record", conflicts_with = "record")]
    input: Option<String>,

    /// A single customer record as a JSON object
    #[arg(long)]
    record: Option<String>,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "<input_name>_features"
    #[arg(long)]
    output_name: Option<String>,

    /// Feature contract JSON file (defaults to the built-in churn contract)
    #[arg(long, env = "CHURN_CONTRACT")]
    contract: Option<PathBuf>,

    /// Linear model JSON file; when given, every row is scored
    #[arg(long)]
    model: Option<PathBuf>,

    /// Preview the column mapping without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Leave absent model features out instead of filling them with 0
    #[arg(long)]
    no_fill_absent: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env may set CHURN_CONTRACT, so load it before parsing
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let contract = load_contract(&args)?;
    let table = load_input(&args)?;
    info!("Input loaded: {} rows x {} columns", table.height(), table.width());

    if args.dry_run {
        return run_dry_run(&args, table, &contract);
    }

    let pipeline = build_pipeline(&args, contract)?;
    run_pipeline(&pipeline, &args, table)
}

fn load_contract(args: &Args) -> Result<FeatureContract> {
    let mut contract = match &args.contract {
        Some(path) => {
            info!("Loading feature contract from: {}", path.display());
            FeatureContract::from_json_file(path)?
        }
        None => FeatureContract::default(),
    };

    if args.no_fill_absent {
        contract.fill_absent_features = false;
    }
    contract.validate()?;
    Ok(contract)
}

fn load_input(args: &Args) -> Result<RawTable> {
    if let Some(record) = &args.record {
        return Ok(RawTable::from_json_str(record)?);
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("Either --input or --record is required"))?;
    if !Path::new(input).exists() {
        return Err(anyhow!("Input file not found: {}", input));
    }

    info!("Loading dataset from: {}", input);
    Ok(ingest::load_table(input)?)
}

/// Name shown for the input in reports.
fn input_label(args: &Args) -> String {
    args.input.clone().unwrap_or_else(|| "<inline>".to_string())
}

/// Extract the file stem (name without extension) from the input path.
fn input_stem(args: &Args) -> String {
    args.input
        .as_deref()
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("record")
        .to_string()
}

fn build_pipeline(args: &Args, contract: FeatureContract) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().contract(contract);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run dry-run mode - show the column mapping without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(args: &Args, table: RawTable, contract: &FeatureContract) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of column mapping");
    println!("{}\n", "=".repeat(80));

    println!("INPUT OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Source: {}", input_label(args));
    println!("  Rows: {}", table.height());
    println!("  Columns: {}", table.width());
    println!();

    let raw_names: Vec<String> = table.names().iter().map(|n| n.to_string()).collect();
    let (normalized, collisions) = KeyNormalizer.normalize_table(table);
    let (resolved, resolution) = AliasResolver.resolve(normalized, contract);

    println!("COLUMN MAPPING");
    println!("{}", "-".repeat(40));
    println!("{:<30} {:<25} {:<20}", "Raw label", "Key", "Canonical");
    println!("{}", "-".repeat(75));
    for raw in &raw_names {
        let key = churn_features::cleaner::normalize_key(raw);
        let canonical = resolution
            .renames
            .iter()
            .find(|r| r.raw_key == key)
            .map(|r| {
                if r.converted_units {
                    format!("{} (years -> months)", r.canonical)
                } else {
                    r.canonical.clone()
                }
            })
            .unwrap_or_else(|| {
                let is_canonical = contract.aliases.iter().any(|a| a.canonical == key);
                if is_canonical && !resolution.shadowed.contains(&key) {
                    key.clone()
                } else {
                    "-".to_string()
                }
            });
        println!("{:<30} {:<25} {:<20}", truncate_str(raw, 29), truncate_str(&key, 24), canonical);
    }
    for key in &collisions {
        println!("  WARNING: several labels normalize to '{}'; the last one is kept", key);
    }
    for key in &resolution.shadowed {
        println!("  WARNING: '{}' ignored, another alias was matched first", key);
    }
    println!();

    println!("MODEL SCHEMA");
    println!("{}", "-".repeat(40));
    for feature in &contract.model_features {
        let status = if resolved.contains(feature) {
            "present"
        } else if feature == churn_features::schema::ONLINE_SERVICE
            || feature == churn_features::schema::STREAMING
            || feature == churn_features::schema::PHONE_SERVICE
            || (feature == churn_features::schema::SENIOR_CITIZEN
                && resolved.contains(churn_features::schema::AGE))
        {
            "derived"
        } else if contract.fill_absent_features {
            "absent, filled with 0"
        } else {
            "absent"
        };
        println!("  {:<20} {}", feature, status);
    }
    let labeled = resolved.contains(churn_features::schema::CHURN);
    println!(
        "  Mode: {}",
        if labeled { "labeled (rows with unrecognized churn labels are dropped)" } else { "inference" }
    );
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let default_name = format!("{}_features", input_stem(args));
    let output_name = args.output_name.as_deref().unwrap_or(&default_name);
    println!("  - {}/{}.csv", args.output, output_name);
    if args.emit_report {
        println!("  - {}/{}_report.json", args.output, input_stem(args));
    }
    println!();
    println!("{}", "=".repeat(80));
    println!("To execute this pipeline, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Run pipeline, optionally score, and write outputs
fn run_pipeline(pipeline: &Pipeline, args: &Args, table: RawTable) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting churn feature pipeline...");
    info!("{}", "=".repeat(80));

    let result = pipeline.process(table).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let scoring = match &args.model {
        Some(path) => Some(score_batch(path, &result)?),
        None => None,
    };

    let generator = ReportGenerator::new(PathBuf::from(&args.output), args.output_name.clone());
    let output_path =
        generator.write_features_csv(&result.batch, &format!("{}_features", input_stem(args)))?;

    let report = ReportGenerator::build_comprehensive_report(
        &input_label(args),
        Some(&output_path.display().to_string()),
        &result,
        scoring,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let report_path = generator.write_report_to_file(&report, &input_stem(args))?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Score the batch with a linear model and package the results for the report.
fn score_batch(model_path: &Path, result: &PipelineResult) -> Result<serde_json::Value> {
    let model = LinearModel::load(model_path)?;
    let model_name = model.name.clone();
    let scorer = Scorer::from_linear(model, ScoringConfig::default());
    let (records, summary) = scorer.score_and_summarize(&result.batch)?;

    Ok(json!({
        "model": model_name,
        "summary": summary,
        "records": records,
    }))
}

/// Print a human-readable summary of the pipeline results.
fn print_human_readable_summary(report: &ComprehensiveReport) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("FEATURE PIPELINE COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.rows_before, summary.columns_before
    );
    if let Some(ref output_file) = report.output_file {
        println!(
            "Output: {} ({} rows x {} features)",
            output_file, summary.rows_after, summary.columns_after
        );
    }
    println!("Mode:   {}", if summary.labeled { "labeled" } else { "inference" });
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} dropped for unrecognized labels)",
        summary.rows_before, summary.rows_after, summary.rows_dropped
    );
    println!("  Cells imputed: {}", summary.cells_imputed);
    println!("  Negative values rejected: {}", summary.negatives_rejected);
    println!("  Ambiguous values defaulted: {}", summary.ambiguous_values);
    if summary.sorted_by_id {
        println!("  Rows sorted by customer id");
    }
    println!();

    if !report.alias_renames.is_empty() {
        println!("Renamed Columns:");
        for rename in &report.alias_renames {
            let units = if rename.converted_units { " (years -> months)" } else { "" };
            println!("  {} -> {}{}", rename.raw_key, rename.canonical, units);
        }
        println!();
    }

    if !report.defaulted_features.is_empty() {
        println!("Filled with 0: {}", report.defaulted_features.join(", "));
    }
    if !report.derived_features.is_empty() {
        println!("Derived: {}", report.derived_features.join(", "));
    }
    if !report.dropped_columns.is_empty() {
        println!("Dropped columns: {}", report.dropped_columns.join(", "));
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
    }

    if let Some(scoring) = &report.scoring {
        print_scoring_summary(scoring);
    }

    println!();
    println!("{}", "=".repeat(80));
}

fn print_scoring_summary(scoring: &serde_json::Value) {
    let Ok(summary) = serde_json::from_value::<BatchSummary>(scoring["summary"].clone()) else {
        return;
    };

    println!();
    println!("Scoring ({}):", scoring["model"].as_str().unwrap_or("model"));
    println!("  Customers: {}", summary.total_customers);
    println!(
        "  Predicted churners: {} ({:.1}%)",
        summary.predicted_churners, summary.churn_rate
    );
    println!("  Average risk score: {:.1}%", summary.average_probability);
    for (level, count) in [
        (RiskLevel::High, summary.risk_distribution.high),
        (RiskLevel::Medium, summary.risk_distribution.medium),
        (RiskLevel::Low, summary.risk_distribution.low),
    ] {
        println!("  {:<7} {:>6}  {}", level.as_str(), count, level.recommended_action());
    }
}
