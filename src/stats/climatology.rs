//! Climatology summaries of a processed dataset.
//!
//! Monthly, seasonal and annual phase totals, the per-month climatology
//! and operating-period anomalies against it.

use super::{mean, sample_std};
use crate::constants::derived_columns::{MONTH, SEASON, SEASON_YEAR, YEAR};
use crate::dataset::Dataset;
use crate::error::{PrecipError, Result};
use crate::models::{PrecipPhase, Season};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: f64,
}

/// Distribution of one calendar month's totals across years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthClimatology {
    pub month: u32,
    pub mean: f64,
    pub std: f64,
    pub years: usize,
}

/// Season total; December counts towards the following year's DJF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTotal {
    pub season_year: i32,
    pub season: Season,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualTotal {
    pub year: i32,
    pub total: f64,
}

/// Least-squares line through (year, total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope_per_year: f64,
    pub intercept: f64,
}

impl LinearTrend {
    pub fn at(&self, year: i32) -> f64 {
        self.intercept + self.slope_per_year * year as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub totals: Vec<AnnualTotal>,
    pub mean: f64,
    /// None with fewer than two distinct years
    pub trend: Option<LinearTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAnomaly {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub climatology_mean: f64,
    pub anomaly: f64,
}

/// Phase totals per (Year, Month), sorted chronologically
pub fn monthly_totals(dataset: &Dataset, phase: PrecipPhase) -> Result<Vec<MonthlyTotal>> {
    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .group_by([col(YEAR), col(MONTH)])
        .agg([col(phase.column()).sum()])
        .sort_by_exprs([col(YEAR), col(MONTH)], SortMultipleOptions::default())
        .collect()?;

    let years = int_column(&grouped, YEAR)?;
    let months = int_column(&grouped, MONTH)?;
    let totals = float_column(&grouped, phase.column())?;

    Ok(years
        .into_iter()
        .zip(months)
        .zip(totals)
        .map(|((year, month), total)| MonthlyTotal {
            year,
            month: month as u32,
            total,
        })
        .collect())
}

/// Mean and spread of each calendar month's totals
pub fn monthly_climatology(dataset: &Dataset, phase: PrecipPhase) -> Result<Vec<MonthClimatology>> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for entry in monthly_totals(dataset, phase)? {
        by_month.entry(entry.month).or_default().push(entry.total);
    }

    Ok(by_month
        .into_iter()
        .map(|(month, totals)| MonthClimatology {
            month,
            mean: mean(&totals),
            std: sample_std(&totals),
            years: totals.len(),
        })
        .collect())
}

/// Phase totals per (SeasonYear, Season)
pub fn seasonal_totals(dataset: &Dataset, phase: PrecipPhase) -> Result<Vec<SeasonalTotal>> {
    let season_year = when(col(MONTH).eq(lit(12)))
        .then(col(YEAR) + lit(1))
        .otherwise(col(YEAR))
        .alias(SEASON_YEAR);

    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .with_column(season_year)
        .group_by([col(SEASON_YEAR), col(SEASON)])
        .agg([col(phase.column()).sum()])
        .collect()?;

    let years = int_column(&grouped, SEASON_YEAR)?;
    let seasons = grouped
        .column(SEASON)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|label| label.unwrap_or_default().parse::<Season>())
        .collect::<Result<Vec<_>>>()?;
    let totals = float_column(&grouped, phase.column())?;

    let mut out: Vec<SeasonalTotal> = years
        .into_iter()
        .zip(seasons)
        .zip(totals)
        .map(|((season_year, season), total)| SeasonalTotal {
            season_year,
            season,
            total,
        })
        .collect();
    out.sort_by_key(|s| (s.season_year, s.season));
    Ok(out)
}

/// Phase totals per calendar year with their mean and linear trend
pub fn annual_totals(dataset: &Dataset, phase: PrecipPhase) -> Result<AnnualSummary> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for entry in monthly_totals(dataset, phase)? {
        *by_year.entry(entry.year).or_insert(0.0) += entry.total;
    }

    let totals: Vec<AnnualTotal> = by_year
        .into_iter()
        .map(|(year, total)| AnnualTotal { year, total })
        .collect();
    let values: Vec<f64> = totals.iter().map(|t| t.total).collect();

    Ok(AnnualSummary {
        mean: mean(&values),
        trend: linear_trend(&totals),
        totals,
    })
}

/// Operating-period monthly totals minus the climatology mean of that month.
///
/// Months missing from the climatology are skipped.
pub fn monthly_anomalies(
    operating: &Dataset,
    climatology: &Dataset,
    phase: PrecipPhase,
) -> Result<Vec<MonthlyAnomaly>> {
    let baseline: BTreeMap<u32, f64> = monthly_climatology(climatology, phase)?
        .into_iter()
        .map(|m| (m.month, m.mean))
        .collect();

    Ok(monthly_totals(operating, phase)?
        .into_iter()
        .filter_map(|entry| {
            baseline.get(&entry.month).map(|climatology_mean| MonthlyAnomaly {
                year: entry.year,
                month: entry.month,
                total: entry.total,
                climatology_mean: *climatology_mean,
                anomaly: entry.total - climatology_mean,
            })
        })
        .collect())
}

fn linear_trend(totals: &[AnnualTotal]) -> Option<LinearTrend> {
    if totals.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = totals.iter().map(|t| t.year as f64).collect();
    let ys: Vec<f64> = totals.iter().map(|t| t.total).collect();
    let (mx, my) = (mean(&xs), mean(&ys));

    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope_per_year = sxy / sxx;

    Some(LinearTrend {
        slope_per_year,
        intercept: my - slope_per_year * mx,
    })
}

fn int_column(frame: &DataFrame, name: &str) -> Result<Vec<i32>> {
    frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .map(|value| {
            value.ok_or_else(|| PrecipError::Configuration {
                message: format!("Column '{}' has missing values", name),
            })
        })
        .collect()
}

fn float_column(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(0.0))
        .collect())
}
