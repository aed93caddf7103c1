//! Derived fields: calendar labels and the rain/snow decomposition.

use crate::constants::derived_columns::{
    DAY, MONTH, RAIN, RESIDUAL, SEASON, SNOW, WARM_COLD, YEAR,
};
use crate::constants::{CM_TO_MM, PRECIP_TOTAL_TOKENS, SNOW_AMOUNT_TOKENS, SNOW_RATE_TOKENS};
use crate::dataset::frame_timestamps;
use crate::error::{PrecipError, Result};
use crate::imputation::column_values;
use crate::models::{FormatDescriptor, FormatKind, Season, warm_cold_label};
use crate::schema::find_column;
use chrono::Datelike;
use polars::prelude::*;
use tracing::debug;

/// Add `Year`, `Month`, `Day`, `Season` and `WarmCold` from `timestamp`
pub fn add_calendar_fields(frame: &mut DataFrame) -> Result<()> {
    let timestamps = frame_timestamps(frame)?;

    let years: Vec<i32> = timestamps.iter().map(|ts| ts.year()).collect();
    let months: Vec<i32> = timestamps.iter().map(|ts| ts.month() as i32).collect();
    let days: Vec<i32> = timestamps.iter().map(|ts| ts.day() as i32).collect();
    let seasons: Vec<&str> = timestamps
        .iter()
        .map(|ts| Season::from_month(ts.month()).as_str())
        .collect();
    let halves: Vec<&str> = timestamps
        .iter()
        .map(|ts| warm_cold_label(ts.month()))
        .collect();

    frame.with_column(Series::new(YEAR.into(), years))?;
    frame.with_column(Series::new(MONTH.into(), months))?;
    frame.with_column(Series::new(DAY.into(), days))?;
    frame.with_column(Series::new(SEASON.into(), seasons))?;
    frame.with_column(Series::new(WARM_COLD.into(), halves))?;
    Ok(())
}

/// Split the total precipitation column into `Rain_mm` and `Snow_mm`.
///
/// Also writes `Precip_Residual_mm`, the total minus snow before rain is
/// floored at zero. Returns the name of the total precipitation column.
pub fn separate_precipitation(frame: &mut DataFrame, descriptor: &FormatDescriptor) -> Result<String> {
    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let names_iter = || names.iter().map(String::as_str);

    let total_column = find_column(names_iter(), PRECIP_TOTAL_TOKENS)
        .ok_or_else(|| PrecipError::column_missing("Precipitation_Total", descriptor.kind))?;
    let rate_column = find_column(names_iter(), SNOW_RATE_TOKENS);
    let amount_column = find_column(names_iter(), SNOW_AMOUNT_TOKENS);

    let rows = frame.height();
    let total = zero_filled(frame, &total_column)?;

    let snow: Vec<f64> = match (descriptor.kind, rate_column, amount_column) {
        (FormatKind::Meteoblue, _, Some(amount)) => zero_filled(frame, &amount)?
            .into_iter()
            .map(|cm| cm * CM_TO_MM)
            .collect(),
        (FormatKind::Synoptic, Some(rate), _) => {
            let minutes = descriptor.time_granularity_minutes;
            zero_filled(frame, &rate)?
                .into_iter()
                .map(|mm_per_hour| mm_per_hour * minutes / 60.0)
                .collect()
        }
        (FormatKind::Synoptic, None, Some(amount)) => zero_filled(frame, &amount)?,
        _ => vec![0.0; rows],
    };

    let residual: Vec<f64> = total.iter().zip(&snow).map(|(t, s)| t - s).collect();
    let rain: Vec<f64> = residual.iter().map(|r| r.max(0.0)).collect();
    let snow: Vec<f64> = snow.into_iter().map(|s| s.max(0.0)).collect();

    let clipped = residual.iter().filter(|r| **r < 0.0).count();
    if clipped > 0 {
        debug!(
            "{} of {} rows report more snow than total precipitation; rain clipped to zero",
            clipped, rows
        );
    }

    frame.with_column(Series::new(RAIN.into(), rain))?;
    frame.with_column(Series::new(SNOW.into(), snow))?;
    frame.with_column(Series::new(RESIDUAL.into(), residual))?;

    Ok(total_column)
}

fn zero_filled(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = frame.column(name)?;
    if column.dtype() != &DataType::Float64 {
        return Err(PrecipError::Configuration {
            message: format!("Column '{}' is not numeric", name),
        });
    }
    Ok(column_values(frame, name)?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}
