//! Meteoblue history exports.
//!
//! Timestamps look like `20200101T0000` and any value that fails to parse
//! aborts the run unless a lenient policy is configured.

use super::FormatParser;
use crate::constants::{METEOBLUE_TIMESTAMP_FORMAT, TIMESTAMP_COLUMN};
use crate::models::FormatKind;
use crate::schema::standardize_meteoblue_name;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, Default)]
pub struct MeteoblueParser;

impl FormatParser for MeteoblueParser {
    fn kind(&self) -> FormatKind {
        FormatKind::Meteoblue
    }

    fn time_column(&self) -> &'static str {
        TIMESTAMP_COLUMN
    }

    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw.trim(), METEOBLUE_TIMESTAMP_FORMAT).ok()
    }

    fn canonical_name(&self, raw: &str) -> String {
        standardize_meteoblue_name(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::PrecipError;
    use crate::models::{FormatDescriptor, TimestampPolicy};

    const PREAMBLE: &str = "location,Moab\nlat,38.57\nlon,-109.55\nasl,1232\nvariable,x\nunit,x\nlevel,x\nresolution,hourly\naggregation,None\n";

    fn parse(body: &str, config: &PipelineConfig) -> crate::error::Result<crate::dataset::Dataset> {
        let text = format!("{}{}", PREAMBLE, body);
        MeteoblueParser.parse(
            &text,
            FormatDescriptor::new(FormatKind::Meteoblue, 9),
            config,
        )
    }

    #[test]
    fn test_parses_and_standardizes_columns() {
        let body = "timestamp,Moab Temperature [2 m elevation corrected],Moab Precipitation Total [sfc],Moab Snowfall Amount [sfc]\n\
                    20200101T0100,-2.0,0.5,0.1\n\
                    20200101T0000,-3.0,0.0,0.0\n";
        let dataset = parse(body, &PipelineConfig::default()).unwrap();

        let names: Vec<String> = dataset
            .frame()
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "timestamp",
                "Temperature_2m",
                "Precipitation_Total",
                "Snowfall_Amount"
            ]
        );
        assert_eq!(dataset.precipitation_column(), "Precipitation_Total");
        assert_eq!(dataset.descriptor().time_granularity_minutes, 60.0);

        // Rows come back sorted by time
        let temps = dataset.numeric_values("Temperature_2m").unwrap();
        assert_eq!(temps, vec![Some(-3.0), Some(-2.0)]);
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let body = "timestamp,Moab Precipitation Total\n20200101T0000,0.0\n2020-01-01 01:00,0.1\n";
        let err = parse(body, &PipelineConfig::default()).unwrap_err();
        match err {
            PrecipError::TimestampParse { format, row, value } => {
                assert_eq!(format, FormatKind::Meteoblue);
                assert_eq!(row, 2);
                assert_eq!(value, "2020-01-01 01:00");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_policy_drops_bad_rows() {
        let body = "timestamp,Moab Precipitation Total\n20200101T0000,0.0\nnot-a-time,0.1\n20200101T0100,0.2\n";
        let config = PipelineConfig::default().with_timestamp_policy(TimestampPolicy::DropInvalid);
        let dataset = parse(body, &config).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_missing_precipitation_total() {
        let body = "timestamp,Moab Temperature [2 m]\n20200101T0000,1.0\n";
        let err = parse(body, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PrecipError::ColumnMissing {
                format: FormatKind::Meteoblue,
                ..
            }
        ));
    }
}
