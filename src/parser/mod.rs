//! Tabular body parsing for the supported export formats.
//!
//! Each format implements [`FormatParser`]: it names its time column, knows
//! how to parse a raw timestamp and how to map a raw column name onto the
//! canonical schema. The shared reading routine drops the preamble, reads
//! the body with polars, parses timestamps under the configured policy,
//! coerces numeric columns and sorts rows by time.

pub mod meteoblue;
pub mod synoptic;

pub use meteoblue::MeteoblueParser;
pub use synoptic::SynopticParser;

use crate::config::PipelineConfig;
use crate::constants::{PRECIP_TOTAL_TOKENS, TIMESTAMP_COLUMN};
use crate::dataset::Dataset;
use crate::error::{PrecipError, Result};
use crate::models::{FormatDescriptor, FormatKind, TimestampPolicy};
use crate::schema::{dedupe_names, find_column, is_numeric_variable};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::io::Cursor;
use tracing::{debug, warn};

/// Format-specific parsing strategy
pub trait FormatParser: Send + Sync {
    fn kind(&self) -> FormatKind;

    /// Raw name of the column carrying timestamps
    fn time_column(&self) -> &'static str;

    /// Lines between the header row and the first data row
    fn lines_after_header(&self) -> usize {
        0
    }

    /// Parse one raw timestamp into naive UTC
    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime>;

    /// Canonical name for a raw, non-time column
    fn canonical_name(&self, raw: &str) -> String;

    /// Parse the decoded file into a pre-imputation dataset
    fn parse(
        &self,
        text: &str,
        descriptor: FormatDescriptor,
        config: &PipelineConfig,
    ) -> Result<Dataset> {
        read_dataset(self, text, descriptor, config)
    }
}

/// Parsing strategy for a detected format
pub fn parser_for(kind: FormatKind) -> Box<dyn FormatParser> {
    match kind {
        FormatKind::Meteoblue => Box::new(MeteoblueParser),
        FormatKind::Synoptic => Box::new(SynopticParser),
    }
}

/// Read the body below the header row as an all-string frame
pub fn read_body(text: &str, header_row: usize, lines_after_header: usize) -> Result<DataFrame> {
    let mut lines = text.lines().skip(header_row);
    let header = lines.next().unwrap_or_default();
    let mut body = String::with_capacity(text.len());
    body.push_str(header);
    body.push('\n');
    for line in lines.skip(lines_after_header) {
        if line.trim().is_empty() {
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()?;

    Ok(frame)
}

/// Values of a string column, with blank cells as `None`
fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = frame.column(name)?.as_materialized_series();
    let values = column
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

/// Parse every cell as `f64`, or `None` if any non-blank cell is not numeric
pub fn coerce_numeric(values: &[Option<String>]) -> Option<Vec<Option<f64>>> {
    values
        .iter()
        .map(|value| match value {
            Some(raw) => raw.parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect()
}

/// Parse every cell as `f64`, turning unparsable cells into `None`.
///
/// Also returns how many non-blank cells were discarded.
pub fn coerce_numeric_lossy(values: &[Option<String>]) -> (Vec<Option<f64>>, usize) {
    let mut discarded = 0;
    let numbers = values
        .iter()
        .map(|value| {
            let raw = value.as_deref()?;
            let parsed = raw.parse::<f64>().ok();
            if parsed.is_none() {
                discarded += 1;
            }
            parsed
        })
        .collect();
    (numbers, discarded)
}

/// Minutes between the first two timestamps, or `default` with fewer than two
pub fn infer_granularity(sorted: &[NaiveDateTime], default: f64) -> f64 {
    match sorted {
        [first, second, ..] => (*second - *first).num_milliseconds() as f64 / 60_000.0,
        _ => default,
    }
}

/// Build a `Datetime(ms)` series named `timestamp`
pub fn timestamp_series(timestamps: &[NaiveDateTime]) -> Result<Series> {
    let millis: Vec<i64> = timestamps
        .iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    let series = Series::new(TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series)
}

fn read_dataset<P: FormatParser + ?Sized>(
    parser: &P,
    text: &str,
    descriptor: FormatDescriptor,
    config: &PipelineConfig,
) -> Result<Dataset> {
    let kind = parser.kind();
    let raw = read_body(text, descriptor.header_row_index, parser.lines_after_header())?;

    let raw_names: Vec<String> = raw
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let time_column = parser.time_column();
    if !raw_names.iter().any(|name| name == time_column) {
        return Err(PrecipError::column_missing(time_column, kind));
    }

    // Parse timestamps, keeping (row, timestamp) for the rows that survive
    let policy = config.timestamp_policy_for(kind);
    let raw_times = string_values(&raw, time_column)?;
    let mut rows: Vec<(usize, NaiveDateTime)> = Vec::with_capacity(raw_times.len());
    let mut dropped = 0usize;
    for (row, value) in raw_times.iter().enumerate() {
        match value.as_deref().and_then(|v| parser.parse_timestamp(v)) {
            Some(timestamp) => rows.push((row, timestamp)),
            None => match policy {
                TimestampPolicy::Strict => {
                    return Err(PrecipError::TimestampParse {
                        format: kind,
                        row: row + 1,
                        value: value.clone().unwrap_or_default(),
                    });
                }
                TimestampPolicy::DropInvalid => dropped += 1,
            },
        }
    }
    if dropped > 0 {
        warn!(
            "Dropped {} of {} {} rows with unparsable timestamps",
            dropped,
            raw_times.len(),
            kind
        );
    }

    rows.sort_by_key(|(_, timestamp)| *timestamp);
    let timestamps: Vec<NaiveDateTime> = rows.iter().map(|(_, ts)| *ts).collect();
    let granularity = infer_granularity(&timestamps, config.default_granularity_minutes);

    let value_names: Vec<&String> = raw_names.iter().filter(|n| *n != time_column).collect();
    let canonical = dedupe_names(
        value_names
            .iter()
            .map(|name| parser.canonical_name(name))
            .filter(|name| name != TIMESTAMP_COLUMN)
            .collect(),
    );
    if canonical.len() != value_names.len() {
        return Err(PrecipError::Configuration {
            message: format!("{} file has more than one timestamp column", kind),
        });
    }

    let mut columns: Vec<Column> = Vec::with_capacity(value_names.len() + 1);
    columns.push(timestamp_series(&timestamps)?.into_column());

    for (raw_name, name) in value_names.iter().zip(&canonical) {
        let values = string_values(&raw, raw_name)?;
        let ordered: Vec<Option<String>> =
            rows.iter().map(|(row, _)| values[*row].clone()).collect();

        let series = match coerce_numeric(&ordered) {
            Some(numbers) => Series::new(name.as_str().into(), numbers),
            None if is_numeric_variable(name) => {
                let (numbers, discarded) = coerce_numeric_lossy(&ordered);
                debug!(
                    "Treating {} non-numeric cells in '{}' as missing",
                    discarded, name
                );
                Series::new(name.as_str().into(), numbers)
            }
            None => {
                debug!("Keeping '{}' as a text column", name);
                Series::new(name.as_str().into(), ordered)
            }
        };
        columns.push(series.into_column());
    }

    let frame = DataFrame::new(columns)?;

    let precipitation_column = find_column(canonical.iter().map(String::as_str), PRECIP_TOTAL_TOKENS)
        .ok_or_else(|| PrecipError::column_missing("Precipitation_Total", kind))?;

    debug!(
        "Parsed {} {} rows, {} columns, granularity {} min",
        frame.height(),
        kind,
        frame.width(),
        granularity
    );

    Ok(Dataset::new(
        frame,
        descriptor.with_granularity(granularity),
        precipitation_column,
    ))
}
