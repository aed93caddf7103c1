//! Command implementations for the precipitation processor CLI
//!
//! Logging setup, command dispatch and the human-readable and JSON
//! reports printed by each command.

use crate::cli::args::{Args, Commands, CommonArgs, CompareArgs, ProcessArgs};
use crate::dataset::Dataset;
use crate::models::{ComparisonResult, DatasetSummary, PrecipPhase};
use crate::processor::DatasetProcessor;
use crate::processor::batch::{BatchProcessor, BatchReport};
use crate::processor::discovery::discover_inputs;
use crate::stats::{compare, monthly_anomalies};
use anyhow::{Context, Result, bail};
use colored::*;
use std::time::Instant;
use tracing::{debug, info};

/// Significance level used for the report verdicts
const ALPHA: f64 = 0.05;

/// Main command runner
pub async fn run(args: Args) -> Result<()> {
    setup_logging(args.common());
    debug!("Command line arguments: {:?}", args);

    match args.command {
        Commands::Process(process_args) => run_process(process_args).await,
        Commands::Compare(compare_args) => run_compare(compare_args).await,
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("precip_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

async fn run_process(args: ProcessArgs) -> Result<()> {
    let config = args.common.pipeline_config();
    config.validate().context("Invalid pipeline configuration")?;

    let files = discover_inputs(&args.inputs).context("Failed to resolve input paths")?;
    if files.is_empty() {
        bail!("No CSV files found in the given inputs");
    }
    info!("Processing {} export files", files.len());

    let batch = BatchProcessor::new(config).with_progress(args.common.show_progress() && !args.json);
    let report = batch.process_files(&files).await;

    if args.json {
        let json = serde_json::to_string_pretty(&report.summaries)
            .context("Failed to serialize summaries")?;
        println!("{}", json);
    } else if !args.common.quiet {
        print_process_report(&report);
    }

    if report.stats.files_failed > 0 {
        bail!(
            "{} of {} files failed to process",
            report.stats.files_failed,
            files.len()
        );
    }
    Ok(())
}

async fn run_compare(args: CompareArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = args.common.pipeline_config();
    config.validate().context("Invalid pipeline configuration")?;

    let processor = DatasetProcessor::new().with_config(config);
    let mut dataset = processor
        .process_file(&args.file)
        .await
        .with_context(|| format!("Failed to process {}", args.file.display()))?;

    if !args.months.is_empty() {
        dataset = dataset
            .filter_months(&args.months)
            .context("Failed to filter months")?;
    }
    if !args.seasons.is_empty() {
        dataset = dataset
            .filter_seasons(&args.seasons)
            .context("Failed to filter seasons")?;
    }
    debug!("{} rows left after calendar filters", dataset.len());

    let mut results = Vec::new();
    for phase in args.phase.phases() {
        let result = compare(&dataset, &args.operating, &args.climatology, phase)
            .with_context(|| format!("Failed to compare {} between periods", phase))?;
        results.push(result);
    }

    if args.json {
        let json =
            serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
        println!("{}", json);
        return Ok(());
    }

    if !args.common.quiet {
        let summary = dataset.summary(args.file.display().to_string())?;
        print_dataset_summary(&summary);
        for result in &results {
            print_comparison(result);
            print_anomalies(&dataset, &args, result.phase)?;
        }
        println!(
            "{}",
            format!("Completed in {:.2}s", start_time.elapsed().as_secs_f64()).bright_black()
        );
    }
    Ok(())
}

fn print_process_report(report: &BatchReport) {
    println!();
    println!("{}", "Processing Summary".bright_green().bold());
    println!("{}", "==================".bright_green());

    for summary in &report.summaries {
        print_dataset_summary(summary);
    }

    for (path, reason) in &report.stats.failures {
        println!("{} {}: {}", "✗".red().bold(), path.display(), reason);
    }

    println!(
        "{} processed, {} failed, {} rows in {} ms",
        report.stats.files_processed.to_string().bright_yellow(),
        report.stats.files_failed.to_string().bright_yellow(),
        report.stats.total_rows.to_string().bright_yellow(),
        report.stats.processing_time_ms
    );
}

fn print_dataset_summary(summary: &DatasetSummary) {
    let span = match (summary.start, summary.end) {
        (Some(start), Some(end)) => format!("{} → {}", start, end),
        _ => "no rows".to_string(),
    };
    println!("{} {}", "✓".green().bold(), summary.source.bright_cyan());
    println!(
        "    {} format, {} rows every {} min, {}",
        summary.format, summary.rows, summary.time_granularity_minutes, span
    );
    println!(
        "    rain {:.1} mm, snow {:.1} mm (from {})",
        summary.total_rain_mm, summary.total_snow_mm, summary.precipitation_column
    );
}

fn print_comparison(result: &ComparisonResult) {
    let verdict = if result.is_significant(ALPHA) {
        "significant".bright_red().bold()
    } else {
        "not significant".bright_black()
    };

    println!();
    println!(
        "{} ({})",
        format!("{} comparison", result.phase).bright_green().bold(),
        verdict
    );
    println!(
        "    operating   {:>8.2} ± {:<8.2} mm/month over {} months",
        result.operating_mean, result.operating_std, result.operating_months
    );
    println!(
        "    climatology {:>8.2} ± {:<8.2} mm/month over {} months",
        result.climatology_mean, result.climatology_std, result.climatology_months
    );
    println!("    t-test p         {:.4}", result.t_pvalue);
    println!("    Mann-Whitney p   {:.4}", result.mannwhitney_pvalue);
    println!("    KS p             {:.4}", result.ks_pvalue);
    println!(
        "    Cohen's d        {:.3} ({})",
        result.cohens_d,
        result.effect_size()
    );
}

fn print_anomalies(dataset: &Dataset, args: &CompareArgs, phase: PrecipPhase) -> Result<()> {
    let operating = dataset.filter_range(&args.operating)?;
    let climatology = dataset.filter_range(&args.climatology)?;
    let anomalies = monthly_anomalies(&operating, &climatology, phase)
        .context("Failed to compute monthly anomalies")?;

    if anomalies.is_empty() {
        return Ok(());
    }

    println!("    monthly anomalies:");
    for anomaly in anomalies {
        let value = format!("{:+.1} mm", anomaly.anomaly);
        let value = if anomaly.anomaly >= 0.0 {
            value.bright_blue()
        } else {
            value.yellow()
        };
        println!(
            "      {}-{:02}  {:>8.1} mm  {}",
            anomaly.year, anomaly.month, anomaly.total, value
        );
    }
    Ok(())
}
