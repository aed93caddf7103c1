//! Missing-value imputation by variable class.
//!
//! Every numeric column is classified by name and filled according to its
//! class policy. The fill routines work on plain `Option<f64>` vectors so
//! they can be reasoned about independently of the frame.

use crate::constants::TIMESTAMP_COLUMN;
use crate::error::Result;
use crate::models::{FillPolicy, VariableClass};
use crate::schema::classify;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What the imputer did to one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnImputation {
    pub column: String,
    pub class: VariableClass,
    pub filled: usize,
}

/// Per-column fill counts for one dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationReport {
    pub columns: Vec<ColumnImputation>,
    /// Columns with no observed value, left null
    pub unfillable: Vec<String>,
}

impl ImputationReport {
    pub fn total_filled(&self) -> usize {
        self.columns.iter().map(|c| c.filled).sum()
    }

    pub fn filled_by_class(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for column in &self.columns {
            *counts.entry(format!("{:?}", column.class)).or_insert(0) += column.filled;
        }
        counts
    }
}

/// Fill the numeric columns of `frame` in place
pub fn impute(frame: &mut DataFrame, limit: usize) -> Result<ImputationReport> {
    let mut report = ImputationReport::default();

    let targets: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != TIMESTAMP_COLUMN && c.dtype() == &DataType::Float64)
        .map(|c| c.name().to_string())
        .collect();

    for name in targets {
        let values = column_values(frame, &name)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            continue;
        }

        let class = classify(&name);
        let policy = class.fill_policy();

        if missing == values.len() && policy != FillPolicy::Zero {
            warn!("Column '{}' has no observed values; leaving it empty", name);
            report.unfillable.push(name);
            continue;
        }

        let filled = apply_policy(&values, policy, limit);
        let remaining = filled.iter().filter(|v| v.is_none()).count();

        frame.with_column(Series::new(name.as_str().into(), filled))?;
        report.columns.push(ColumnImputation {
            column: name,
            class,
            filled: missing - remaining,
        });
    }

    for (class, count) in report.filled_by_class() {
        debug!("Imputed {} values in {} columns", count, class);
    }

    Ok(report)
}

/// Float64 column values with `NaN` read as missing
pub fn column_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = frame
        .column(name)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Fill `values` by `policy`.
///
/// Whatever the policy, the result has no gaps as long as `values` holds at
/// least one observation: anything a limited carry-forward leaves open is
/// closed by the interpolation pass.
pub fn apply_policy(values: &[Option<f64>], policy: FillPolicy, limit: usize) -> Vec<Option<f64>> {
    match policy {
        FillPolicy::Zero => fill_zero(values),
        FillPolicy::Interpolate => interpolate_and_fill(values, limit),
        FillPolicy::CarryForward => {
            let carried = backward_fill(&forward_fill(values, Some(limit)));
            if carried.iter().any(Option::is_none) {
                interpolate_and_fill(&carried, limit)
            } else {
                carried
            }
        }
    }
}

fn interpolate_and_fill(values: &[Option<f64>], limit: usize) -> Vec<Option<f64>> {
    let interpolated = interpolate_limited(values, limit);
    backward_fill(&forward_fill(&interpolated, None))
}

pub fn fill_zero(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(v.unwrap_or(0.0))).collect()
}

/// Linear interpolation by position.
///
/// A missing value inside a gap is filled when it lies within `limit` rows
/// of the valid value on either side. Leading and trailing gaps take the
/// nearest valid value, again only within `limit` rows.
pub fn interpolate_limited(values: &[Option<f64>], limit: usize) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let valid: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return out;
    };

    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a < 2 {
            continue;
        }
        let (va, vb) = (values[a].unwrap_or_default(), values[b].unwrap_or_default());
        let span = (b - a) as f64;
        for (p, slot) in out.iter_mut().enumerate().take(b).skip(a + 1) {
            if p - a <= limit || b - p <= limit {
                *slot = Some(va + (vb - va) * (p - a) as f64 / span);
            }
        }
    }

    for (p, slot) in out.iter_mut().enumerate().take(first) {
        if first - p <= limit {
            *slot = values[first];
        }
    }
    for (p, slot) in out.iter_mut().enumerate().skip(last + 1) {
        if p - last <= limit {
            *slot = values[last];
        }
    }

    out
}

/// Carry the last valid value forward over at most `limit` consecutive gaps
pub fn forward_fill(values: &[Option<f64>], limit: Option<usize>) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut last = None;
    let mut run = 0usize;
    for value in values {
        match value {
            Some(v) => {
                last = Some(*v);
                run = 0;
                out.push(Some(*v));
            }
            None => {
                run += 1;
                if limit.is_none_or(|limit| run <= limit) {
                    out.push(last);
                } else {
                    out.push(None);
                }
            }
        }
    }
    out
}

/// Fill every gap from the next valid value
pub fn backward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut next = None;
    for slot in out.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
    out
}
