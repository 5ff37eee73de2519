//! Volatility-scaled take-profit and callback thresholds.

pub const HIGH_VOLATILITY: f64 = 0.30;
pub const LOW_VOLATILITY: f64 = 0.15;
pub const HIGH_VOLATILITY_MULTIPLIER: f64 = 1.5;
pub const LOW_VOLATILITY_MULTIPLIER: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicThresholds {
    pub target: f64,
    pub callback: f64,
}

impl DynamicThresholds {
    /// Scales both thresholds by the volatility bucket of `annualized_volatility`.
    pub fn adjust(target: f64, callback: f64, annualized_volatility: f64) -> Self {
        let multiplier = volatility_multiplier(annualized_volatility);
        DynamicThresholds {
            target: target * multiplier,
            callback: callback * multiplier,
        }
    }
}

pub fn volatility_multiplier(annualized_volatility: f64) -> f64 {
    if annualized_volatility > HIGH_VOLATILITY {
        HIGH_VOLATILITY_MULTIPLIER
    } else if annualized_volatility < LOW_VOLATILITY {
        LOW_VOLATILITY_MULTIPLIER
    } else {
        1.0
    }
}
