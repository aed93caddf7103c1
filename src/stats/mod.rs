//! Comparative statistics: operating period against climatology.
//!
//! Both periods are cut from the same dataset, reduced to monthly phase
//! totals and compared with a t-test, a Mann-Whitney U test, a two-sample
//! Kolmogorov-Smirnov test and Cohen's d.

pub mod climatology;
pub mod distributions;
pub mod hypothesis;

pub use climatology::{
    AnnualSummary, AnnualTotal, LinearTrend, MonthClimatology, MonthlyAnomaly, MonthlyTotal,
    SeasonalTotal, annual_totals, monthly_anomalies, monthly_climatology, monthly_totals,
    seasonal_totals,
};

use crate::dataset::Dataset;
use crate::error::{PrecipError, Result};
use crate::models::{ComparisonResult, DateRange, PrecipPhase};
use tracing::{debug, info};

/// Compare one precipitation phase between two periods of `dataset`
pub fn compare(
    dataset: &Dataset,
    operating: &DateRange,
    climatology: &DateRange,
    phase: PrecipPhase,
) -> Result<ComparisonResult> {
    let operating_sample = monthly_samples(&dataset.filter_range(operating)?, phase)?;
    let climatology_sample = monthly_samples(&dataset.filter_range(climatology)?, phase)?;

    if operating_sample.is_empty() || climatology_sample.is_empty() {
        return Err(PrecipError::EmptyPeriod {
            operating_empty: operating_sample.is_empty(),
            climatology_empty: climatology_sample.is_empty(),
        });
    }

    debug!(
        "Comparing {} over {} operating and {} climatology months",
        phase,
        operating_sample.len(),
        climatology_sample.len()
    );

    let result = ComparisonResult {
        phase,
        operating_months: operating_sample.len(),
        climatology_months: climatology_sample.len(),
        operating_mean: mean(&operating_sample),
        operating_std: sample_std(&operating_sample),
        climatology_mean: mean(&climatology_sample),
        climatology_std: sample_std(&climatology_sample),
        t_pvalue: hypothesis::t_test(&operating_sample, &climatology_sample),
        mannwhitney_pvalue: hypothesis::mann_whitney_u(&operating_sample, &climatology_sample),
        ks_pvalue: hypothesis::ks_test(&operating_sample, &climatology_sample),
        cohens_d: cohens_d(&operating_sample, &climatology_sample),
    };

    info!(
        "{}: operating mean {:.2} mm, climatology mean {:.2} mm, t p={:.4}, MWU p={:.4}",
        phase,
        result.operating_mean,
        result.climatology_mean,
        result.t_pvalue,
        result.mannwhitney_pvalue
    );

    Ok(result)
}

/// Rain then snow
pub fn compare_all(
    dataset: &Dataset,
    operating: &DateRange,
    climatology: &DateRange,
) -> Result<Vec<ComparisonResult>> {
    PrecipPhase::ALL
        .iter()
        .map(|phase| compare(dataset, operating, climatology, *phase))
        .collect()
}

/// Monthly totals of a phase, in (year, month) order
pub fn monthly_samples(dataset: &Dataset, phase: PrecipPhase) -> Result<Vec<f64>> {
    Ok(monthly_totals(dataset, phase)?
        .into_iter()
        .map(|m| m.total)
        .collect())
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); 0 for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Standardized mean difference of `a` over `b`, 0 when both are constant
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let pooled = ((sample_variance(a) + sample_variance(b)) / 2.0).sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled
}
