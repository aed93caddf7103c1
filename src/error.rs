//! Error handling for precipitation processing operations.
//!
//! Provides error types with enough context (format, column, row, period)
//! for callers to report ingestion and comparison failures precisely.

use crate::models::FormatKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Timestamp parse failed in {format} file at data row {row}: '{value}'")]
    TimestampParse {
        format: FormatKind,
        row: usize,
        value: String,
    },

    #[error("Required column '{column}' not found in {format} file")]
    ColumnMissing { column: String, format: FormatKind },

    #[error("No monthly samples in {}", empty_sides(.operating_empty, .climatology_empty))]
    EmptyPeriod {
        operating_empty: bool,
        climatology_empty: bool,
    },

    #[error("Invalid date range '{value}': {reason}")]
    InvalidRange { value: String, reason: String },

    #[error("Input path not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

fn empty_sides(operating_empty: &bool, climatology_empty: &bool) -> &'static str {
    match (*operating_empty, *climatology_empty) {
        (true, true) => "operating and climatology periods",
        (true, false) => "operating period",
        (false, true) => "climatology period",
        (false, false) => "neither period",
    }
}

impl PrecipError {
    pub fn column_missing(column: impl Into<String>, format: FormatKind) -> Self {
        Self::ColumnMissing {
            column: column.into(),
            format,
        }
    }

    pub fn invalid_range(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrecipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_period_names_sides() {
        let err = PrecipError::EmptyPeriod {
            operating_empty: false,
            climatology_empty: true,
        };
        assert_eq!(err.to_string(), "No monthly samples in climatology period");

        let err = PrecipError::EmptyPeriod {
            operating_empty: true,
            climatology_empty: true,
        };
        assert!(err.to_string().contains("operating and climatology"));
    }

    #[test]
    fn test_column_missing_names_format() {
        let err = PrecipError::column_missing("Precipitation_Total", FormatKind::Synoptic);
        assert_eq!(
            err.to_string(),
            "Required column 'Precipitation_Total' not found in Synoptic file"
        );
    }
}
