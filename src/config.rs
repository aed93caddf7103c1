//! Configuration management and validation.
//!
//! Provides the pipeline configuration: imputation limits, timestamp
//! handling overrides, header-row overrides and batch concurrency.

use crate::constants::{DEFAULT_GRANULARITY_MINUTES, DEFAULT_INTERPOLATION_LIMIT};
use crate::error::{PrecipError, Result};
use crate::models::{FormatKind, TimestampPolicy};
use serde::{Deserialize, Serialize};

/// Global configuration for precipitation processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Longest run of missing samples filled by interpolation or forward fill
    pub interpolation_limit: usize,

    /// Granularity used when a file has fewer than two valid timestamps
    pub default_granularity_minutes: f64,

    /// Header row (0-based) for files that fall through to the legacy
    /// Meteoblue layout. A header found by detection always wins; this never
    /// forces a row onto a recognized Meteoblue or Synoptic file.
    pub header_row_override: Option<usize>,

    /// Force one timestamp policy for both formats (None = per-format default)
    pub timestamp_policy: Option<TimestampPolicy>,

    /// Maximum files processed concurrently in batch mode
    pub max_concurrent_files: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interpolation_limit: DEFAULT_INTERPOLATION_LIMIT,
            default_granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            header_row_override: None,
            timestamp_policy: None,
            max_concurrent_files: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    /// Set the interpolation / forward-fill run-length limit
    pub fn with_interpolation_limit(mut self, limit: usize) -> Self {
        self.interpolation_limit = limit;
        self
    }

    /// Use a fixed header row for legacy Meteoblue files
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row_override = Some(header_row);
        self
    }

    /// Apply one timestamp policy to both formats
    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = Some(policy);
        self
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Timestamp policy in effect for a format
    pub fn timestamp_policy_for(&self, kind: FormatKind) -> TimestampPolicy {
        self.timestamp_policy
            .unwrap_or_else(|| kind.native_timestamp_policy())
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.interpolation_limit == 0 {
            return Err(PrecipError::Configuration {
                message: "interpolation_limit must be at least 1".to_string(),
            });
        }
        if !(self.default_granularity_minutes.is_finite() && self.default_granularity_minutes > 0.0)
        {
            return Err(PrecipError::Configuration {
                message: format!(
                    "default_granularity_minutes must be positive, got {}",
                    self.default_granularity_minutes
                ),
            });
        }
        if self.max_concurrent_files == 0 {
            return Err(PrecipError::Configuration {
                message: "max_concurrent_files must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
