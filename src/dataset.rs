//! The canonical dataset produced by the pipeline and its filters.

use crate::constants::TIMESTAMP_COLUMN;
use crate::constants::derived_columns::{RAIN, SNOW};
use crate::error::{PrecipError, Result};
use crate::imputation::column_values;
use crate::models::{DatasetSummary, DateRange, FormatDescriptor, PrecipPhase, Season};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use polars::prelude::*;

/// A parsed station export: the frame, its format and its precipitation column
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    descriptor: FormatDescriptor,
    precipitation_column: String,
}

impl Dataset {
    pub fn new(frame: DataFrame, descriptor: FormatDescriptor, precipitation_column: String) -> Self {
        Self {
            frame,
            descriptor,
            precipitation_column,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut DataFrame {
        &mut self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    pub fn precipitation_column(&self) -> &str {
        &self.precipitation_column
    }

    pub fn set_precipitation_column(&mut self, column: String) {
        self.precipitation_column = column;
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        frame_timestamps(&self.frame)
    }

    /// Values of a Float64 column, `NaN` read as missing
    pub fn numeric_values(&self, column: &str) -> Result<Vec<Option<f64>>> {
        column_values(&self.frame, column)
    }

    /// Per-row millimetres of one precipitation phase
    pub fn phase_values(&self, phase: PrecipPhase) -> Result<Vec<f64>> {
        Ok(self
            .numeric_values(phase.column())?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }

    /// Rows whose timestamp falls inside `range` (inclusive)
    pub fn filter_range(&self, range: &DateRange) -> Result<Dataset> {
        self.filter_by(|ts| range.contains(ts))
    }

    /// Rows in the given calendar months (1-12)
    pub fn filter_months(&self, months: &[u32]) -> Result<Dataset> {
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(PrecipError::Configuration {
                message: format!("Month {} is outside 1-12", bad),
            });
        }
        self.filter_by(|ts| months.contains(&ts.month()))
    }

    /// Rows in the given meteorological seasons
    pub fn filter_seasons(&self, seasons: &[Season]) -> Result<Dataset> {
        self.filter_by(|ts| seasons.contains(&Season::from_month(ts.month())))
    }

    fn filter_by<F>(&self, keep: F) -> Result<Dataset>
    where
        F: Fn(&NaiveDateTime) -> bool,
    {
        let mask: Vec<bool> = self.timestamps()?.iter().map(keep).collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        Ok(Dataset {
            frame: self.frame.filter(&mask)?,
            descriptor: self.descriptor,
            precipitation_column: self.precipitation_column.clone(),
        })
    }

    /// Metadata a caller keeps instead of the dataset
    pub fn summary(&self, source: impl Into<String>) -> Result<DatasetSummary> {
        let timestamps = self.timestamps()?;
        let total = |column: &str| -> Result<f64> {
            if self.frame.column(column).is_err() {
                return Ok(0.0);
            }
            Ok(self.numeric_values(column)?.into_iter().flatten().sum())
        };

        Ok(DatasetSummary {
            source: source.into(),
            format: self.descriptor.kind,
            rows: self.len(),
            start: timestamps.first().copied(),
            end: timestamps.last().copied(),
            time_granularity_minutes: self.descriptor.time_granularity_minutes,
            precipitation_column: self.precipitation_column.clone(),
            total_rain_mm: total(RAIN)?,
            total_snow_mm: total(SNOW)?,
        })
    }
}

/// Timestamps of a frame's `timestamp` column as naive UTC
pub fn frame_timestamps(frame: &DataFrame) -> Result<Vec<NaiveDateTime>> {
    let millis = frame
        .column(TIMESTAMP_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;

    millis
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|datetime| datetime.naive_utc())
                .ok_or_else(|| {
                    PrecipError::Polars(PolarsError::ComputeError(
                        format!("missing timestamp at row {}", row).into(),
                    ))
                })
        })
        .collect()
}
