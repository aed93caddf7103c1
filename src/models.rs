//! Core data structures and types for precipitation processing.
//!
//! Defines the source format descriptor, variable classes and their fill
//! policies, calendar labels, comparison ranges and result types used
//! throughout the library.

use crate::constants::{COLD_LABEL, DEFAULT_GRANULARITY_MINUTES, WARM_LABEL, WARM_MONTHS};
use crate::error::{PrecipError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Station-logger export formats understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    Meteoblue,
    Synoptic,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Meteoblue => write!(f, "Meteoblue"),
            FormatKind::Synoptic => write!(f, "Synoptic"),
        }
    }
}

impl FormatKind {
    /// Timestamp handling used when no override is configured
    pub fn native_timestamp_policy(&self) -> TimestampPolicy {
        match self {
            FormatKind::Meteoblue => TimestampPolicy::Strict,
            FormatKind::Synoptic => TimestampPolicy::DropInvalid,
        }
    }
}

/// What to do with a row whose timestamp cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampPolicy {
    /// Abort the run with a `TimestampParse` error
    Strict,
    /// Drop the row and keep going
    DropInvalid,
}

/// Result of format detection, refined by the parser
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub kind: FormatKind,
    pub header_row_index: usize,
    pub time_granularity_minutes: f64,
}

impl FormatDescriptor {
    pub fn new(kind: FormatKind, header_row_index: usize) -> Self {
        Self {
            kind,
            header_row_index,
            time_granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }

    pub fn with_granularity(self, time_granularity_minutes: f64) -> Self {
        Self {
            time_granularity_minutes,
            ..self
        }
    }
}

/// Variable classes driving the imputation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableClass {
    Accumulation,
    Temperature,
    WindSpeed,
    WindDirection,
    Humidity,
    PressureHeight,
    Cloud,
    Radiation,
    Unclassified,
}

/// Gap-filling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Replace missing values with zero
    Zero,
    /// Limited linear interpolation, then forward and backward fill
    Interpolate,
    /// Limited forward fill, then backward fill
    CarryForward,
}

impl VariableClass {
    pub fn fill_policy(&self) -> FillPolicy {
        match self {
            VariableClass::Accumulation | VariableClass::Radiation => FillPolicy::Zero,
            VariableClass::WindDirection | VariableClass::Cloud => FillPolicy::CarryForward,
            VariableClass::Temperature
            | VariableClass::WindSpeed
            | VariableClass::Humidity
            | VariableClass::PressureHeight
            | VariableClass::Unclassified => FillPolicy::Interpolate,
        }
    }
}

/// Precipitation phase selector for aggregation and comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipPhase {
    Rain,
    Snow,
}

impl PrecipPhase {
    pub const ALL: [PrecipPhase; 2] = [PrecipPhase::Rain, PrecipPhase::Snow];

    /// Derived column holding this phase in millimetres
    pub fn column(&self) -> &'static str {
        match self {
            PrecipPhase::Rain => "Rain_mm",
            PrecipPhase::Snow => "Snow_mm",
        }
    }
}

impl fmt::Display for PrecipPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecipPhase::Rain => write!(f, "rain"),
            PrecipPhase::Snow => write!(f, "snow"),
        }
    }
}

impl FromStr for PrecipPhase {
    type Err = PrecipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rain" => Ok(PrecipPhase::Rain),
            "snow" => Ok(PrecipPhase::Snow),
            other => Err(PrecipError::Configuration {
                message: format!("Unknown precipitation phase '{}' (expected rain or snow)", other),
            }),
        }
    }
}

/// Meteorological season
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    DJF,
    MAM,
    JJA,
    SON,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::DJF, Season::MAM, Season::JJA, Season::SON];

    /// Season for a calendar month (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::DJF,
            3..=5 => Season::MAM,
            6..=8 => Season::JJA,
            _ => Season::SON,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::DJF => "DJF",
            Season::MAM => "MAM",
            Season::JJA => "JJA",
            Season::SON => "SON",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = PrecipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DJF" => Ok(Season::DJF),
            "MAM" => Ok(Season::MAM),
            "JJA" => Ok(Season::JJA),
            "SON" => Ok(Season::SON),
            other => Err(PrecipError::Configuration {
                message: format!("Unknown season '{}' (expected DJF, MAM, JJA or SON)", other),
            }),
        }
    }
}

/// Warm/cold half-year label for a calendar month
pub fn warm_cold_label(month: u32) -> &'static str {
    if WARM_MONTHS.contains(&month) {
        WARM_LABEL
    } else {
        COLD_LABEL
    }
}

/// Inclusive timestamp range used to select comparison periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(PrecipError::invalid_range(
                format!("{}..{}", start, end),
                "start is after end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse start and end strings.
    ///
    /// A date-only end is widened to the last millisecond of that day so
    /// `2020-01-01..2020-12-31` covers the whole of the 31st.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_bound(start, false)?;
        let end = parse_bound(end, true)?;
        Self::new(start, end)
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }
}

impl FromStr for DateRange {
    type Err = PrecipError;

    /// Parse `START..END`
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| PrecipError::invalid_range(s, "expected START..END"))?;
        Self::parse(start, end)
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

fn parse_bound(value: &str, end_of_day: bool) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime);
        }
    }

    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| PrecipError::invalid_range(value, e.to_string()))?;

    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| PrecipError::invalid_range(value, "invalid time of day"))?;

    Ok(date.and_time(time))
}

/// Effect size buckets for Cohen's d
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSize {
    Negligible,
    Small,
    Medium,
    Large,
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EffectSize::Negligible => "negligible",
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
        };
        f.write_str(label)
    }
}

/// Operating period vs climatology comparison for one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub phase: PrecipPhase,
    pub operating_months: usize,
    pub climatology_months: usize,
    pub operating_mean: f64,
    pub operating_std: f64,
    pub climatology_mean: f64,
    pub climatology_std: f64,
    pub t_pvalue: f64,
    pub mannwhitney_pvalue: f64,
    pub ks_pvalue: f64,
    pub cohens_d: f64,
}

impl ComparisonResult {
    /// True when the t-test or the Mann-Whitney test rejects at `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.t_pvalue < alpha || self.mannwhitney_pvalue < alpha
    }

    pub fn effect_size(&self) -> EffectSize {
        let magnitude = self.cohens_d.abs();
        if magnitude < 0.2 {
            EffectSize::Negligible
        } else if magnitude < 0.5 {
            EffectSize::Small
        } else if magnitude < 0.8 {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }
}

/// What a caller keeps about a processed file instead of the dataset itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub source: String,
    pub format: FormatKind,
    pub rows: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub time_granularity_minutes: f64,
    pub precipitation_column: String,
    pub total_rain_mm: f64,
    pub total_snow_mm: f64,
}

/// Batch processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_is_function_of_month() {
        let expected = [
            (1, Season::DJF),
            (2, Season::DJF),
            (3, Season::MAM),
            (5, Season::MAM),
            (6, Season::JJA),
            (8, Season::JJA),
            (9, Season::SON),
            (11, Season::SON),
            (12, Season::DJF),
        ];
        for (month, season) in expected {
            assert_eq!(Season::from_month(month), season, "month {}", month);
        }
    }

    #[test]
    fn test_warm_cold_label() {
        assert_eq!(warm_cold_label(3), "Cold");
        assert_eq!(warm_cold_label(4), "Warm");
        assert_eq!(warm_cold_label(10), "Warm");
        assert_eq!(warm_cold_label(11), "Cold");
    }

    #[test]
    fn test_fill_policy_by_class() {
        assert_eq!(VariableClass::Accumulation.fill_policy(), FillPolicy::Zero);
        assert_eq!(VariableClass::Radiation.fill_policy(), FillPolicy::Zero);
        assert_eq!(VariableClass::Cloud.fill_policy(), FillPolicy::CarryForward);
        assert_eq!(
            VariableClass::WindDirection.fill_policy(),
            FillPolicy::CarryForward
        );
        assert_eq!(
            VariableClass::Unclassified.fill_policy(),
            FillPolicy::Interpolate
        );
    }

    #[test]
    fn test_date_range_parsing() {
        let range: DateRange = "2020-01-01..2020-12-31".parse().unwrap();
        assert_eq!(range.start.to_string(), "2020-01-01 00:00:00");
        assert_eq!(range.end.to_string(), "2020-12-31 23:59:59.999");

        let range = DateRange::parse("2020-01-01T06:00", "2020-01-01T18:30:00").unwrap();
        assert_eq!(range.end.to_string(), "2020-01-01 18:30:00");
    }

    #[test]
    fn test_date_range_rejects_bad_input() {
        assert!(matches!(
            DateRange::parse("yesterday", "2020-01-01"),
            Err(PrecipError::InvalidRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("2021-01-01", "2020-01-01"),
            Err(PrecipError::InvalidRange { .. })
        ));
        assert!(matches!(
            "2020-01-01".parse::<DateRange>(),
            Err(PrecipError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_effect_size_buckets() {
        let mut result = ComparisonResult {
            phase: PrecipPhase::Rain,
            operating_months: 3,
            climatology_months: 3,
            operating_mean: 0.0,
            operating_std: 0.0,
            climatology_mean: 0.0,
            climatology_std: 0.0,
            t_pvalue: 0.5,
            mannwhitney_pvalue: 0.04,
            ks_pvalue: 0.5,
            cohens_d: -0.1,
        };
        assert_eq!(result.effect_size(), EffectSize::Negligible);
        assert!(result.is_significant(0.05));

        result.cohens_d = 0.65;
        assert_eq!(result.effect_size(), EffectSize::Medium);
        result.cohens_d = -1.2;
        assert_eq!(result.effect_size(), EffectSize::Large);
    }
}
