//! Risk statistics over a trailing window of daily returns.

use crate::domain::nav::NavSeries;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fewer returns than this yields the neutral snapshot.
pub const MIN_RETURN_OBSERVATIONS: usize = 10;

fn trailing_finite(returns: &[f64], window: usize) -> impl Iterator<Item = f64> + '_ {
    let start = returns.len().saturating_sub(window);
    returns[start..].iter().copied().filter(|r| r.is_finite())
}

/// Number of returns [`RiskSnapshot::compute`] would use.
pub fn usable_returns(returns: &[f64], window: usize) -> usize {
    trailing_finite(returns, window).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskSnapshot {
    pub sharpe: f64,
    pub annualized_volatility: f64,
    pub annualized_return: f64,
}

impl RiskSnapshot {
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Snapshot over the last `window` entries of `returns`.
    ///
    /// Non-finite returns are ignored. With fewer than
    /// [`MIN_RETURN_OBSERVATIONS`] usable returns every field is 0.
    pub fn compute(returns: &[f64], window: usize, risk_free_rate: f64) -> Self {
        let trailing: Vec<f64> = trailing_finite(returns, window).collect();

        if trailing.len() < MIN_RETURN_OBSERVATIONS {
            return Self::neutral();
        }

        let n = trailing.len() as f64;
        let mean = trailing.iter().sum::<f64>() / n;
        let variance = trailing.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let stddev = variance.sqrt();

        let annualized_return = mean * TRADING_DAYS_PER_YEAR;
        let annualized_volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();

        let sharpe = if annualized_volatility > 0.0 {
            (annualized_return - risk_free_rate) / annualized_volatility
        } else {
            0.0
        };

        if !(sharpe.is_finite() && annualized_volatility.is_finite() && annualized_return.is_finite()) {
            return Self::neutral();
        }

        RiskSnapshot {
            sharpe,
            annualized_volatility,
            annualized_return,
        }
    }

    pub fn from_series(series: &NavSeries, window: usize, risk_free_rate: f64) -> Self {
        Self::compute(&series.daily_returns(), window, risk_free_rate)
    }

    /// True when the snapshot came from too little data.
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn too_few_returns_is_neutral() {
        let returns = vec![0.01; 9];
        let snap = RiskSnapshot::compute(&returns, 60, 0.025);
        assert_eq!(snap, RiskSnapshot::neutral());
        assert!(snap.is_neutral());
    }

    #[test]
    fn single_zero_variance_observation() {
        let snap = RiskSnapshot::compute(&[0.0], 60, 0.025);
        assert_eq!(snap.sharpe, 0.0);
        assert_eq!(snap.annualized_volatility, 0.0);
        assert_eq!(snap.annualized_return, 0.0);
    }

    #[test]
    fn zero_volatility_gives_zero_sharpe() {
        let returns = vec![0.001; 30];
        let snap = RiskSnapshot::compute(&returns, 60, 0.025);
        assert_eq!(snap.sharpe, 0.0);
        assert_relative_eq!(snap.annualized_volatility, 0.0, epsilon = 1e-12);
        assert_relative_eq!(snap.annualized_return, 0.252, epsilon = 1e-12);
    }

    #[test]
    fn known_values() {
        // alternating +2% / 0%: mean 1%, sample stddev over 10 obs
        let returns: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 0.02 } else { 0.0 }).collect();
        let snap = RiskSnapshot::compute(&returns, 60, 0.025);

        let mean = 0.01;
        let stddev = (10.0 * 0.01_f64.powi(2) / 9.0).sqrt();
        let ann_ret = mean * 252.0;
        let ann_vol = stddev * 252.0_f64.sqrt();

        assert_relative_eq!(snap.annualized_return, ann_ret, epsilon = 1e-12);
        assert_relative_eq!(snap.annualized_volatility, ann_vol, epsilon = 1e-12);
        assert_relative_eq!(snap.sharpe, (ann_ret - 0.025) / ann_vol, epsilon = 1e-12);
    }

    #[test]
    fn only_trailing_window_is_used() {
        let mut returns = vec![0.5; 50];
        returns.extend(vec![0.001; 20]);
        let snap = RiskSnapshot::compute(&returns, 20, 0.0);
        assert_relative_eq!(snap.annualized_return, 0.252, epsilon = 1e-12);
    }

    #[test]
    fn window_shorter_than_minimum_is_neutral() {
        let returns = vec![0.01; 100];
        let snap = RiskSnapshot::compute(&returns, 5, 0.025);
        assert!(snap.is_neutral());
    }

    #[test]
    fn non_finite_returns_are_ignored() {
        let mut returns = vec![0.001; 12];
        returns.push(f64::INFINITY);
        returns.push(f64::NAN);
        let snap = RiskSnapshot::compute(&returns, 60, 0.0);
        assert!(snap.sharpe.is_finite());
        assert_relative_eq!(snap.annualized_return, 0.252, epsilon = 1e-12);
    }

    #[test]
    fn usable_returns_counts_finite_trailing_window() {
        let mut returns = vec![0.001; 12];
        returns.push(f64::NAN);
        returns.push(f64::INFINITY);
        assert_eq!(usable_returns(&returns, 60), 12);
        assert_eq!(usable_returns(&returns, 5), 3);
        assert_eq!(usable_returns(&[f64::NAN; 20], 60), 0);
    }
}
