//! Two-sample hypothesis tests on monthly totals.
//!
//! All tests are two-sided and return a p-value in `[0, 1]` (or `NaN` when
//! the test is undefined for the given sample sizes).

use super::distributions::{kolmogorov_q, normal_sf, student_t_two_sided};
use super::{mean, sample_variance};
use crate::constants::{KS_EXACT_MAX_CELLS, MANNWHITNEY_EXACT_MAX_N};

/// Student's independent two-sample t-test with pooled variance
pub fn t_test(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    if df <= 0.0 {
        return f64::NAN;
    }

    let (m1, m2) = (mean(a), mean(b));
    let pooled = ((n1 - 1.0) * sample_variance(a) + (n2 - 1.0) * sample_variance(b)) / df;
    let standard_error = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();

    if standard_error == 0.0 {
        return if m1 == m2 { 1.0 } else { 0.0 };
    }
    student_t_two_sided((m1 - m2) / standard_error, df)
}

/// Mann-Whitney U test.
///
/// Uses the exact null distribution of U when both samples are small and
/// there are no ties, otherwise the normal approximation with tie and
/// continuity correction.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return f64::NAN;
    }

    let (ranks, tie_sizes) = rank_with_ties(a, b);
    let rank_sum: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.max(u2);

    let has_ties = tie_sizes.iter().any(|t| *t > 1);
    if n1 <= MANNWHITNEY_EXACT_MAX_N && n2 <= MANNWHITNEY_EXACT_MAX_N && !has_ties {
        return (2.0 * exact_u_upper_tail(n1, n2, u.round() as usize)).min(1.0);
    }

    let n = (n1 + n2) as f64;
    let tie_term: f64 = tie_sizes
        .iter()
        .map(|t| {
            let t = *t as f64;
            t * t * t - t
        })
        .sum();
    let variance = (n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        return 1.0;
    }

    let mu = (n1 * n2) as f64 / 2.0;
    let z = (u - mu - 0.5) / variance.sqrt();
    (2.0 * normal_sf(z)).clamp(0.0, 1.0)
}

/// Average ranks of the pooled sample (`a` first, then `b`) and tie group sizes
fn rank_with_ties(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let mut order: Vec<usize> = (0..pooled.len()).collect();
    order.sort_by(|&i, &j| pooled[i].total_cmp(&pooled[j]));

    let mut ranks = vec![0.0; pooled.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && pooled[order[end]] == pooled[order[start]] {
            end += 1;
        }
        // Ranks start+1 ..= end share their average
        let average = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = average;
        }
        tie_sizes.push(end - start);
        start = end;
    }
    (ranks, tie_sizes)
}

/// `P(U >= u)` under the null for sample sizes `m` and `n`.
///
/// Counts arrangements with the recurrence
/// `f(i, j, u) = f(i - 1, j, u - j) + f(i, j - 1, u)`.
fn exact_u_upper_tail(m: usize, n: usize, u: usize) -> f64 {
    let max_u = m * n;
    // counts[i][j][k]: arrangements of i and j observations with U = k
    let mut counts = vec![vec![Vec::<f64>::new(); n + 1]; m + 1];
    for i in 0..=m {
        for j in 0..=n {
            let mut row = vec![0.0; i * j + 1];
            if i == 0 || j == 0 {
                row[0] = 1.0;
            } else {
                for (k, slot) in row.iter_mut().enumerate() {
                    let from_first = if k >= j {
                        counts[i - 1][j].get(k - j).copied().unwrap_or(0.0)
                    } else {
                        0.0
                    };
                    let from_second = counts[i][j - 1].get(k).copied().unwrap_or(0.0);
                    *slot = from_first + from_second;
                }
            }
            counts[i][j] = row;
        }
    }

    let distribution = &counts[m][n];
    let total: f64 = distribution.iter().sum();
    let tail: f64 = distribution[u.min(max_u)..].iter().sum();
    tail / total
}

/// Largest vertical distance between the two empirical CDFs
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    d
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Exact lattice-path probability when `n * m` is at most
/// [`KS_EXACT_MAX_CELLS`], asymptotic Kolmogorov distribution beyond.
pub fn ks_test(a: &[f64], b: &[f64]) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return f64::NAN;
    }

    let d = ks_statistic(a, b);
    if d <= 0.0 {
        return 1.0;
    }

    if n * m <= KS_EXACT_MAX_CELLS {
        let threshold = (d * (n * m) as f64).round() as i64;
        return (1.0 - ks_paths_inside(n, m, threshold)).clamp(0.0, 1.0);
    }

    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * d)
}

/// Probability that a uniformly random monotone path from `(0, 0)` to
/// `(n, m)` keeps `|i * m - j * n| < threshold` at every point
fn ks_paths_inside(n: usize, m: usize, threshold: i64) -> f64 {
    let inside = |i: usize, j: usize| ((i * m) as i64 - (j * n) as i64).abs() < threshold;
    // Probability of stepping along i from (i, j)
    let step_i = |i: usize, j: usize| (n - i) as f64 / ((n - i) + (m - j)) as f64;

    let mut previous = vec![0.0; m + 1];
    let mut current = vec![0.0; m + 1];
    for i in 0..=n {
        for j in 0..=m {
            current[j] = if !inside(i, j) {
                0.0
            } else if i == 0 && j == 0 {
                1.0
            } else {
                let from_i = if i > 0 {
                    previous[j] * step_i(i - 1, j)
                } else {
                    0.0
                };
                let from_j = if j > 0 {
                    current[j - 1] * (1.0 - step_i(i, j - 1))
                } else {
                    0.0
                };
                from_i + from_j
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[m]
}
