//! Main processing engine.
//!
//! Runs one export through the four pipeline stages (detection, parsing,
//! imputation and derived fields) and hands back the canonical dataset.
//! Batch processing of many files lives in [`batch`].

pub mod batch;
pub mod discovery;

#[cfg(test)]
pub mod tests;

use crate::config::PipelineConfig;
use crate::constants::FALLBACK_HEADER_ROW;
use crate::dataset::Dataset;
use crate::derived::{add_calendar_fields, separate_precipitation};
use crate::error::{PrecipError, Result};
use crate::header::{decode_source, detect_format_with_fallback, preamble_lines};
use crate::imputation::impute;
use crate::parser::parser_for;
use std::path::Path;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info};

/// Turns raw station exports into canonical datasets
#[derive(Debug, Clone, Default)]
pub struct DatasetProcessor {
    config: PipelineConfig,
}

impl DatasetProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the processor
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read and process one file
    pub fn process_path(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(PrecipError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        self.process_bytes(&path.display().to_string(), &bytes)
    }

    /// Read and process one file without blocking the async runtime
    pub async fn process_file(&self, path: &Path) -> Result<Dataset> {
        let processor = self.clone();
        let owned = path.to_path_buf();
        task::spawn_blocking(move || processor.process_path(&owned))
            .await
            .map_err(|e| PrecipError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Processing task failed: {}", e),
            })?
    }

    /// Process an export already in memory; `source` is only used for logging
    pub fn process_bytes(&self, source: &str, bytes: &[u8]) -> Result<Dataset> {
        self.config.validate()?;
        let start_time = Instant::now();

        // Step 1: decode and detect the format
        let text = decode_source(bytes);
        let fallback_row = self.config.header_row_override.unwrap_or(FALLBACK_HEADER_ROW);
        let descriptor = detect_format_with_fallback(&preamble_lines(&text), fallback_row);
        debug!(
            "{}: {} format, header on row {}",
            source, descriptor.kind, descriptor.header_row_index
        );

        // Step 2: parse the body into the canonical schema
        let mut dataset = parser_for(descriptor.kind).parse(&text, descriptor, &self.config)?;

        // Step 3: fill gaps
        let report = impute(dataset.frame_mut(), self.config.interpolation_limit)?;
        debug!(
            "{}: imputed {} values, {} empty columns",
            source,
            report.total_filled(),
            report.unfillable.len()
        );

        // Step 4: calendar fields and the rain/snow split
        let descriptor = *dataset.descriptor();
        add_calendar_fields(dataset.frame_mut())?;
        let precipitation_column = separate_precipitation(dataset.frame_mut(), &descriptor)?;
        dataset.set_precipitation_column(precipitation_column);

        info!(
            "Processed {} ({}): {} rows at {} min in {} ms",
            source,
            descriptor.kind,
            dataset.len(),
            descriptor.time_granularity_minutes,
            start_time.elapsed().as_millis()
        );

        Ok(dataset)
    }
}
