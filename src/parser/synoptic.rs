//! Synoptic station exports.
//!
//! The header row is followed by a units row. `Date_Time` values carry a
//! UTC offset and are converted to naive UTC; by default rows whose
//! timestamp cannot be parsed are dropped rather than failing the file.

use super::FormatParser;
use crate::constants::{SYNOPTIC_TIME_COLUMN, SYNOPTIC_TIMESTAMP_FORMAT};
use crate::models::FormatKind;
use crate::schema::standardize_synoptic_name;
use chrono::{DateTime, NaiveDateTime};

#[derive(Debug, Clone, Copy, Default)]
pub struct SynopticParser;

impl FormatParser for SynopticParser {
    fn kind(&self) -> FormatKind {
        FormatKind::Synoptic
    }

    fn time_column(&self) -> &'static str {
        SYNOPTIC_TIME_COLUMN
    }

    fn lines_after_header(&self) -> usize {
        1
    }

    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        DateTime::parse_from_str(raw, SYNOPTIC_TIMESTAMP_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|datetime| datetime.naive_utc())
    }

    fn canonical_name(&self, raw: &str) -> String {
        standardize_synoptic_name(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::PrecipError;
    use crate::models::{FormatDescriptor, TimestampPolicy};

    const PREAMBLE: &str = "# STATION: MOAB1\n# STATION NAME: Moab\n";

    fn parse(body: &str, config: &PipelineConfig) -> crate::error::Result<crate::dataset::Dataset> {
        let text = format!("{}{}", PREAMBLE, body);
        SynopticParser.parse(&text, FormatDescriptor::new(FormatKind::Synoptic, 2), config)
    }

    #[test]
    fn test_timestamp_converted_to_utc() {
        let ts = SynopticParser
            .parse_timestamp("2020-09-30T02:40:00-0600")
            .unwrap();
        assert_eq!(ts.to_string(), "2020-09-30 08:40:00");

        let ts = SynopticParser.parse_timestamp("2020-09-30T08:40:00Z").unwrap();
        assert_eq!(ts.to_string(), "2020-09-30 08:40:00");

        assert!(SynopticParser.parse_timestamp("30/09/2020 08:40").is_none());
    }

    #[test]
    fn test_parses_body_and_renames() {
        let body = "Station_ID,Date_Time,air_temp_set_1,precip_accum_ten_minute_set_1,estimated_snowfall_rate_set_1\n\
                    ,,Celsius,Millimeters,Millimeters/hour\n\
                    MOAB1,2020-01-01T00:10:00+0000,-1.0,0.2,\n\
                    MOAB1,2020-01-01T00:00:00+0000,-2.0,0.0,6.0\n";
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
                "Station_ID",
                "Temperature_2m",
                "Precipitation_Total",
                "Snowfall_Rate"
            ]
        );
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.descriptor().time_granularity_minutes, 10.0);
        assert_eq!(
            dataset.numeric_values("Snowfall_Rate").unwrap(),
            vec![Some(6.0), None]
        );
    }

    #[test]
    fn test_bad_rows_dropped_by_default() {
        let body = "Station_ID,Date_Time,precip_accum_ten_minute_set_1\n\
                    ,,Millimeters\n\
                    MOAB1,2020-01-01T00:00:00+0000,0.0\n\
                    MOAB1,garbage,0.5\n\
                    MOAB1,2020-01-01T00:10:00+0000,0.1\n";
        let dataset = parse(body, &PipelineConfig::default()).unwrap();
        assert_eq!(dataset.len(), 2);

        let strict = PipelineConfig::default().with_timestamp_policy(TimestampPolicy::Strict);
        assert!(matches!(
            parse(body, &strict),
            Err(PrecipError::TimestampParse { row: 2, .. })
        ));
    }

    #[test]
    fn test_missing_date_time_column() {
        let body = "Station_ID,precip_accum_ten_minute_set_1\n,Millimeters\nMOAB1,0.0\n";
        let err = parse(body, &PipelineConfig::default()).unwrap_err();
        match err {
            PrecipError::ColumnMissing { column, format } => {
                assert_eq!(column, "Date_Time");
                assert_eq!(format, FormatKind::Synoptic);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
