//! Integration tests for the full pipeline through the public API
//!
//! Multi-year daily Meteoblue exports are generated on the fly, written to a
//! temporary directory and run through processing, comparison and the
//! climatology summaries.

use chrono::{Datelike, Duration, NaiveDate};
use precip_processor::{
    DateRange, FormatKind, PrecipError, PrecipPhase, Season, annual_totals, compare, compare_all,
    monthly_anomalies, monthly_climatology, seasonal_totals,
};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

/// Daily Meteoblue export; `total_for(year)` mm fall every day and 0.1 cm of
/// that is snow on winter (DJF) days
fn meteoblue_export(years: &[i32], total_for: impl Fn(i32) -> f64) -> String {
    let mut out = String::from(
        "location,Moab,Moab,Moab\n\
         lat,38.57,38.57,38.57\n\
         lon,-109.55,-109.55,-109.55\n\
         asl,1232.0,1232.0,1232.0\n\
         variable,Precipitation Total,Snowfall Amount,Temperature\n\
         unit,mm,cm,°C\n\
         level,sfc,sfc,2 m elevation corrected\n\
         resolution,daily,daily,daily\n\
         aggregation,Summation,Summation,Mean\n\
         timestamp,Moab Precipitation Total [sfc],Moab Snowfall Amount [sfc],Moab Temperature [2 m elevation corrected]\n",
    );

    for year in years {
        let mut day = NaiveDate::from_ymd_opt(*year, 1, 1).unwrap();
        while day.year() == *year {
            let winter = Season::from_month(day.month()) == Season::DJF;
            let snow_cm = if winter { 0.1 } else { 0.0 };
            let temperature = if winter { -2.0 } else { 15.0 };
            writeln!(
                out,
                "{},{},{},{}",
                day.format("%Y%m%dT0000"),
                total_for(*year),
                snow_cm,
                temperature
            )
            .unwrap();
            day += Duration::days(1);
        }
    }
    out
}

fn range(s: &str) -> DateRange {
    s.parse().unwrap()
}

#[test]
fn test_process_file_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("moab_daily.csv");
    fs::write(&path, meteoblue_export(&[2019, 2020], |_| 2.0)).unwrap();

    let dataset = precip_processor::process(&path).unwrap();
    assert_eq!(dataset.descriptor().kind, FormatKind::Meteoblue);
    assert_eq!(dataset.descriptor().time_granularity_minutes, 1440.0);
    assert_eq!(dataset.len(), 365 + 366);

    let rain = dataset.phase_values(PrecipPhase::Rain).unwrap();
    let snow = dataset.phase_values(PrecipPhase::Snow).unwrap();
    assert!(rain.iter().all(|v| *v >= 0.0));
    assert!(snow.iter().all(|v| *v >= 0.0));
    // 1 January: 0.1 cm of snow is 1 mm, the remaining 1 mm is rain
    assert_eq!(snow[0], 1.0);
    assert_eq!(rain[0], 1.0);

    let summary = dataset.summary(path.display().to_string()).unwrap();
    assert_eq!(summary.rows, 731);
    assert_eq!(summary.precipitation_column, "Precipitation_Total");
}

#[test]
fn test_identical_periods() {
    let export = meteoblue_export(&[2018, 2019, 2020], |_| 2.0);
    let dataset = precip_processor::process_bytes("identical", export.as_bytes()).unwrap();
    let period = range("2018-01-01..2020-12-31");

    let results = compare_all(&dataset, &period, &period).unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.operating_mean, result.climatology_mean);
        assert_eq!(result.cohens_d, 0.0);
        assert!((result.t_pvalue - 1.0).abs() < 1e-9);
        assert!((result.mannwhitney_pvalue - 1.0).abs() < 1e-9);
        assert!((result.ks_pvalue - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_empty_climatology_period() {
    let export = meteoblue_export(&[2020], |_| 2.0);
    let dataset = precip_processor::process_bytes("empty", export.as_bytes()).unwrap();

    let err = compare(
        &dataset,
        &range("2020-01-01..2020-12-31"),
        &range("1991-01-01..2000-12-31"),
        PrecipPhase::Snow,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        PrecipError::EmptyPeriod {
            operating_empty: false,
            climatology_empty: true
        }
    ));
    assert!(err.to_string().contains("climatology period"));
}

#[test]
fn test_wet_operating_year() {
    let years = [2015, 2016, 2017, 2018, 2019, 2020];
    let export = meteoblue_export(&years, |year| if year == 2020 { 5.0 } else { 2.0 });
    let dataset = precip_processor::process_bytes("wet", export.as_bytes()).unwrap();

    let operating = range("2020-01-01..2020-12-31");
    let climatology = range("2015-01-01..2019-12-31");
    let rain = compare(&dataset, &operating, &climatology, PrecipPhase::Rain).unwrap();

    assert_eq!(rain.operating_months, 12);
    assert_eq!(rain.climatology_months, 60);
    assert!(rain.operating_mean > rain.climatology_mean);
    assert!(rain.t_pvalue < 0.001);
    assert!(rain.mannwhitney_pvalue < 0.001);
    assert!(rain.ks_pvalue < 0.001);
    assert!(rain.cohens_d > 0.8);

    // Every operating month is wetter than its climatology
    let anomalies = monthly_anomalies(
        &dataset.filter_range(&operating).unwrap(),
        &dataset.filter_range(&climatology).unwrap(),
        PrecipPhase::Rain,
    )
    .unwrap();
    assert_eq!(anomalies.len(), 12);
    assert!(anomalies.iter().all(|a| a.anomaly > 0.0));

    let annual = annual_totals(&dataset, PrecipPhase::Rain).unwrap();
    assert_eq!(annual.totals.len(), 6);
    assert!(annual.trend.unwrap().slope_per_year > 0.0);
}

#[test]
fn test_seasonal_and_monthly_climatology() {
    let export = meteoblue_export(&[2018, 2019], |_| 2.0);
    let dataset = precip_processor::process_bytes("seasons", export.as_bytes()).unwrap();

    let seasons = seasonal_totals(&dataset, PrecipPhase::Snow).unwrap();
    // January and February 2018 open the series
    assert_eq!(seasons[0].season_year, 2018);
    assert_eq!(seasons[0].season, Season::DJF);
    assert_eq!(seasons[0].total, 59.0);
    // December 2018 belongs to the 2019 winter
    let winter_2019 = seasons
        .iter()
        .find(|s| s.season_year == 2019 && s.season == Season::DJF)
        .unwrap();
    assert_eq!(winter_2019.total, 90.0);
    // December 2019 alone makes up the 2020 winter
    let last = seasons.last().unwrap();
    assert_eq!((last.season_year, last.season, last.total), (2020, Season::DJF, 31.0));

    let climatology = monthly_climatology(&dataset, PrecipPhase::Snow).unwrap();
    assert_eq!(climatology.len(), 12);
    let january = &climatology[0];
    assert_eq!((january.month, january.mean, january.std, january.years), (1, 31.0, 0.0, 2));
    let july = &climatology[6];
    assert_eq!((july.month, july.mean), (7, 0.0));

    let annual = annual_totals(&dataset, PrecipPhase::Snow).unwrap();
    assert_eq!(annual.mean, 90.0);
    assert_eq!(annual.trend.unwrap().slope_per_year, 0.0);
}

#[test]
fn test_calendar_filters_before_comparison() {
    let export = meteoblue_export(&[2018, 2019, 2020], |year| 1.0 + year as f64 - 2018.0);
    let dataset = precip_processor::process_bytes("filters", export.as_bytes()).unwrap();

    let winter = dataset.filter_seasons(&[Season::DJF]).unwrap();
    let result = compare(
        &winter,
        &range("2020-01-01..2020-12-31"),
        &range("2018-01-01..2019-12-31"),
        PrecipPhase::Snow,
    )
    .unwrap();
    assert_eq!(result.operating_months, 3);
    assert_eq!(result.climatology_months, 6);

    let july = dataset.filter_months(&[7]).unwrap();
    assert_eq!(july.len(), 31 * 3);
    assert!(dataset.filter_months(&[0]).is_err());
}
