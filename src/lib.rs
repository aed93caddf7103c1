//! Precipitation Processor Library
//!
//! A Rust library for turning raw meteorological station exports into a
//! canonical, gap-filled dataset and comparing precipitation between an
//! operating period and a long-run climatology.
//!
//! This library provides tools for:
//! - Detecting Meteoblue and Synoptic export formats from the file preamble
//! - Parsing and standardizing column names into one canonical schema
//! - Filling missing observations with variable-class-specific strategies
//! - Deriving calendar fields and splitting precipitation into rain and snow
//! - Comparing monthly totals with t, Mann-Whitney U and Kolmogorov-Smirnov tests
//! - Monthly, seasonal and annual climatology summaries

pub mod cli;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod derived;
pub mod error;
pub mod header;
pub mod imputation;
pub mod models;
pub mod parser;
pub mod processor;
pub mod schema;
pub mod stats;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use dataset::Dataset;
pub use error::{PrecipError, Result};
pub use models::{
    ComparisonResult, DatasetSummary, DateRange, EffectSize, FormatDescriptor, FormatKind,
    PrecipPhase, Season, TimestampPolicy, VariableClass,
};
pub use processor::DatasetProcessor;
pub use processor::batch::{BatchProcessor, BatchReport};
pub use stats::{
    AnnualSummary, AnnualTotal, LinearTrend, MonthClimatology, MonthlyAnomaly, MonthlyTotal,
    SeasonalTotal, annual_totals, compare, compare_all, monthly_anomalies, monthly_climatology,
    monthly_totals, seasonal_totals,
};

use std::path::Path;

/// Process one export file with the default configuration
pub fn process(path: impl AsRef<Path>) -> Result<Dataset> {
    DatasetProcessor::new().process_path(path.as_ref())
}

/// Process an export already in memory with the default configuration
pub fn process_bytes(source: &str, bytes: &[u8]) -> Result<Dataset> {
    DatasetProcessor::new().process_bytes(source, bytes)
}
