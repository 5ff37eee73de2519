//! Cross-holding daily-return correlation.

use crate::domain::nav::NavSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

pub const HIGH_CORRELATION: f64 = 0.80;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighCorrelationPair {
    pub holding_a: String,
    pub holding_b: String,
    pub correlation: f64,
}

/// Symmetric Pearson correlation matrix. `values[i][j]` pairs `ids[i]` with `ids[j]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub ids: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Number of aligned dates the returns were taken from.
    pub aligned_dates: usize,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.ids.iter().position(|id| id == a)?;
        let j = self.ids.iter().position(|id| id == b)?;
        Some(self.values[i][j])
    }

    /// Unordered pairs with correlation strictly above [`HIGH_CORRELATION`].
    pub fn high_correlation_pairs(&self) -> Vec<HighCorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.ids.len() {
            for j in (i + 1)..self.ids.len() {
                let c = self.values[i][j];
                if c > HIGH_CORRELATION {
                    pairs.push(HighCorrelationPair {
                        holding_a: self.ids[i].clone(),
                        holding_b: self.ids[j].clone(),
                        correlation: c,
                    });
                }
            }
        }
        pairs
    }
}

/// Correlates holdings over the dates every usable series shares.
///
/// Empty series are left out. Fewer than two usable holdings, or fewer than two
/// aligned returns, gives an empty matrix.
pub fn correlate(series: &[(&str, &NavSeries)]) -> CorrelationMatrix {
    let usable: Vec<(&str, &NavSeries)> = series
        .iter()
        .filter(|(_, s)| !s.is_empty())
        .copied()
        .collect();
    if usable.len() < 2 {
        return CorrelationMatrix::default();
    }

    let common = common_dates(&usable);
    let returns: Vec<Vec<f64>> = usable
        .iter()
        .map(|(_, s)| aligned_returns(s, &common))
        .collect();

    if returns.iter().any(|r| r.len() < 2) {
        return CorrelationMatrix::default();
    }

    let n = usable.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let c = pearson(&returns[i], &returns[j]);
            values[i][j] = c;
            values[j][i] = c;
        }
    }

    CorrelationMatrix {
        ids: usable.iter().map(|(id, _)| id.to_string()).collect(),
        values,
        aligned_dates: common.len(),
    }
}

fn common_dates(series: &[(&str, &NavSeries)]) -> Vec<NaiveDate> {
    let mut iter = series.iter();
    let mut common: BTreeSet<NaiveDate> = match iter.next() {
        Some((_, s)) => s.points().iter().map(|p| p.date).collect(),
        None => return Vec::new(),
    };
    for (_, s) in iter {
        let dates: BTreeSet<NaiveDate> = s.points().iter().map(|p| p.date).collect();
        common = common.intersection(&dates).copied().collect();
    }
    common.into_iter().collect()
}

fn aligned_returns(series: &NavSeries, dates: &[NaiveDate]) -> Vec<f64> {
    let navs: Vec<f64> = dates.iter().filter_map(|&d| series.nav_on(d)).collect();
    navs.windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Pearson correlation; 0 when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    let c = cov / (var_a.sqrt() * var_b.sqrt());
    if c.is_finite() { c.clamp(-1.0, 1.0) } else { 0.0 }
}
