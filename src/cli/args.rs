//! Command-line argument definitions for the precipitation processor
//!
//! Defines the CLI using the clap derive API: a `process` command for
//! ingesting exports and a `compare` command for operating period versus
//! climatology statistics.

use crate::config::PipelineConfig;
use crate::constants::DEFAULT_INTERPOLATION_LIMIT;
use crate::models::{DateRange, PrecipPhase, Season, TimestampPolicy};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the precipitation processor
///
/// Normalizes Meteoblue and Synoptic station exports, splits precipitation
/// into rain and snow and compares an operating period against climatology.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "precip-processor",
    version,
    about = "Normalize station exports and compare precipitation against climatology",
    long_about = "Reads Meteoblue and Synoptic station CSV exports, maps them onto one canonical \
                  schema, fills missing observations by variable class, splits total \
                  precipitation into rain and snow and compares monthly totals of an operating \
                  period against a climatology baseline."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process export files and print a summary for each
    Process(ProcessArgs),
    /// Compare an operating period against climatology for one export
    Compare(CompareArgs),
}

/// Flags shared by every command
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Longest run of missing samples filled by interpolation or forward fill
    #[arg(
        long = "interpolation-limit",
        value_name = "SAMPLES",
        default_value_t = DEFAULT_INTERPOLATION_LIMIT
    )]
    pub interpolation_limit: usize,

    /// Header row (0-based) for files without format markers; detected headers win
    #[arg(long = "header-row", value_name = "ROW")]
    pub header_row: Option<usize>,

    /// Abort on any unparsable timestamp, whatever the format
    #[arg(long = "strict-timestamps", conflicts_with = "lenient_timestamps")]
    pub strict_timestamps: bool,

    /// Drop rows with unparsable timestamps, whatever the format
    #[arg(long = "lenient-timestamps")]
    pub lenient_timestamps: bool,

    /// Maximum number of files processed at once
    #[arg(long = "max-concurrent", value_name = "COUNT")]
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Export files or directories (searched recursively for *.csv)
    #[arg(value_name = "PATH", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Emit the summaries as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
pub struct CompareArgs {
    /// Export file to analyse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Operating period, e.g. 2021-11-01..2022-04-30
    #[arg(long = "operating", value_name = "START..END")]
    pub operating: DateRange,

    /// Climatology period, e.g. 1991-01-01..2020-12-31
    #[arg(long = "climatology", value_name = "START..END")]
    pub climatology: DateRange,

    /// Precipitation phase to compare
    #[arg(long = "phase", value_enum, default_value = "both")]
    pub phase: PhaseChoice,

    /// Only keep these calendar months (comma-separated, 1-12)
    #[arg(
        long = "months",
        value_name = "LIST",
        value_delimiter = ',',
        value_parser = clap::value_parser!(u32).range(1..=12)
    )]
    pub months: Vec<u32>,

    /// Only keep these seasons (comma-separated: DJF, MAM, JJA, SON)
    #[arg(long = "seasons", value_name = "LIST", value_delimiter = ',')]
    pub seasons: Vec<Season>,

    /// Emit the comparison results as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseChoice {
    Rain,
    Snow,
    Both,
}

impl PhaseChoice {
    pub fn phases(&self) -> Vec<PrecipPhase> {
        match self {
            PhaseChoice::Rain => vec![PrecipPhase::Rain],
            PhaseChoice::Snow => vec![PrecipPhase::Snow],
            PhaseChoice::Both => PrecipPhase::ALL.to_vec(),
        }
    }
}

impl Args {
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Commands::Process(args) => &args.common,
            Commands::Compare(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Timestamp policy forced on both formats, if any
    pub fn timestamp_policy(&self) -> Option<TimestampPolicy> {
        if self.strict_timestamps {
            Some(TimestampPolicy::Strict)
        } else if self.lenient_timestamps {
            Some(TimestampPolicy::DropInvalid)
        } else {
            None
        }
    }

    /// Pipeline configuration built from defaults and command-line overrides
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config =
            PipelineConfig::default().with_interpolation_limit(self.interpolation_limit);
        if let Some(row) = self.header_row {
            config = config.with_header_row(row);
        }
        if let Some(policy) = self.timestamp_policy() {
            config = config.with_timestamp_policy(policy);
        }
        if let Some(max) = self.max_concurrent {
            config = config.with_max_concurrent_files(max);
        }
        config
    }
}
