//! Advisory classification.
//!
//! A fixed, ordered rule table maps the current position metrics to exactly one
//! [`AdvisoryState`]. The first matching rule wins. There is no memory of
//! earlier cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const EMERGENCY_STOP: f64 = -0.30;
pub const STOP_LOSS: f64 = -0.20;
pub const HIGH_QUALITY_SHARPE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryState {
    EmergencyStopLoss,
    StopLossAdvised,
    NearStopLoss,
    TrendReversalTakeProfit,
    DrawdownTriggered,
    StrongHoldHighQuality,
    StrongHold,
    BelowMovingAverage,
    AccumulatingNormally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Critical and high alerts trigger notification.
    pub fn is_notifiable(self) -> bool {
        self >= AlertLevel::High
    }
}

impl AdvisoryState {
    pub fn alert_level(self) -> AlertLevel {
        match self {
            AdvisoryState::EmergencyStopLoss => AlertLevel::Critical,
            AdvisoryState::StopLossAdvised | AdvisoryState::TrendReversalTakeProfit => {
                AlertLevel::High
            }
            AdvisoryState::NearStopLoss | AdvisoryState::DrawdownTriggered => AlertLevel::Medium,
            AdvisoryState::StrongHoldHighQuality
            | AdvisoryState::StrongHold
            | AdvisoryState::BelowMovingAverage
            | AdvisoryState::AccumulatingNormally => AlertLevel::Low,
        }
    }

    /// One-line suggested action.
    pub fn suggestion(self) -> &'static str {
        match self {
            AdvisoryState::EmergencyStopLoss => "loss beyond emergency limit, exit the position",
            AdvisoryState::StopLossAdvised => "stop loss: loss limit hit and trend is down",
            AdvisoryState::NearStopLoss => "near stop loss, watch closely",
            AdvisoryState::TrendReversalTakeProfit => "take profit to lock in gains",
            AdvisoryState::DrawdownTriggered => "watch drawdown risk",
            AdvisoryState::StrongHoldHighQuality => "hold, strong risk-adjusted return",
            AdvisoryState::StrongHold => "hold",
            AdvisoryState::BelowMovingAverage => "below moving average, observe",
            AdvisoryState::AccumulatingNormally => "continue regular investment",
        }
    }
}

impl fmt::Display for AdvisoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdvisoryState::EmergencyStopLoss => "Emergency stop loss",
            AdvisoryState::StopLossAdvised => "Stop loss advised",
            AdvisoryState::NearStopLoss => "Near stop loss",
            AdvisoryState::TrendReversalTakeProfit => "Trend reversal (take profit)",
            AdvisoryState::DrawdownTriggered => "Drawdown triggered",
            AdvisoryState::StrongHoldHighQuality => "Strong hold (high quality)",
            AdvisoryState::StrongHold => "Strong hold",
            AdvisoryState::BelowMovingAverage => "Below moving average",
            AdvisoryState::AccumulatingNormally => "Accumulating",
        };
        write!(f, "{label}")
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertLevel::Low => "low",
            AlertLevel::Medium => "medium",
            AlertLevel::High => "high",
            AlertLevel::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// Everything the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisoryInputs {
    pub profit_rate: f64,
    pub drawdown: f64,
    pub is_below_ma: bool,
    pub dynamic_target: f64,
    pub dynamic_callback: f64,
    pub sharpe: f64,
}

impl AdvisoryInputs {
    fn target_reached(&self) -> bool {
        self.profit_rate >= self.dynamic_target
    }

    fn callback_hit(&self) -> bool {
        self.drawdown >= self.dynamic_callback
    }

    fn stop_loss_zone(&self) -> bool {
        self.profit_rate <= STOP_LOSS
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisoryResult {
    pub state: AdvisoryState,
    pub alert_level: AlertLevel,
}

pub struct AdvisoryRule {
    pub name: &'static str,
    pub matches: fn(&AdvisoryInputs) -> bool,
    pub state: AdvisoryState,
}

/// Rules in priority order. The last rule always matches.
pub const RULES: &[AdvisoryRule] = &[
    AdvisoryRule {
        name: "emergency_stop",
        matches: |i| i.profit_rate <= EMERGENCY_STOP,
        state: AdvisoryState::EmergencyStopLoss,
    },
    AdvisoryRule {
        name: "stop_loss_below_ma",
        matches: |i| i.stop_loss_zone() && i.is_below_ma,
        state: AdvisoryState::StopLossAdvised,
    },
    AdvisoryRule {
        name: "near_stop_loss",
        matches: |i| i.stop_loss_zone(),
        state: AdvisoryState::NearStopLoss,
    },
    AdvisoryRule {
        name: "trend_reversal",
        matches: |i| i.target_reached() && i.callback_hit() && i.is_below_ma,
        state: AdvisoryState::TrendReversalTakeProfit,
    },
    AdvisoryRule {
        name: "drawdown_triggered",
        matches: |i| i.target_reached() && i.callback_hit(),
        state: AdvisoryState::DrawdownTriggered,
    },
    AdvisoryRule {
        name: "strong_hold_high_quality",
        matches: |i| i.target_reached() && i.sharpe > HIGH_QUALITY_SHARPE,
        state: AdvisoryState::StrongHoldHighQuality,
    },
    AdvisoryRule {
        name: "strong_hold",
        matches: |i| i.target_reached(),
        state: AdvisoryState::StrongHold,
    },
    AdvisoryRule {
        name: "below_ma",
        matches: |i| i.is_below_ma,
        state: AdvisoryState::BelowMovingAverage,
    },
    AdvisoryRule {
        name: "accumulating",
        matches: |_| true,
        state: AdvisoryState::AccumulatingNormally,
    },
];

pub fn classify(inputs: &AdvisoryInputs) -> AdvisoryResult {
    let state = RULES
        .iter()
        .find(|rule| (rule.matches)(inputs))
        .map(|rule| rule.state)
        .unwrap_or(AdvisoryState::AccumulatingNormally);
    AdvisoryResult {
        state,
        alert_level: state.alert_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(profit_rate: f64) -> AdvisoryInputs {
        AdvisoryInputs {
            profit_rate,
            drawdown: 0.0,
            is_below_ma: false,
            dynamic_target: 0.12,
            dynamic_callback: 0.05,
            sharpe: 0.0,
        }
    }

    #[test]
    fn emergency_stop_overrides_everything() {
        for below in [false, true] {
            for (dd, sharpe) in [(0.0, 0.0), (0.9, 3.0), (0.5, -1.0)] {
                let i = AdvisoryInputs {
                    drawdown: dd,
                    is_below_ma: below,
                    sharpe,
                    ..inputs(-0.30)
                };
                let r = classify(&i);
                assert_eq!(r.state, AdvisoryState::EmergencyStopLoss);
                assert_eq!(r.alert_level, AlertLevel::Critical);
            }
        }
    }

    #[test]
    fn stop_loss_depends_on_trend() {
        let below = AdvisoryInputs {
            is_below_ma: true,
            ..inputs(-0.25)
        };
        let r = classify(&below);
        assert_eq!(r.state, AdvisoryState::StopLossAdvised);
        assert_eq!(r.alert_level, AlertLevel::High);

        let r = classify(&inputs(-0.20));
        assert_eq!(r.state, AdvisoryState::NearStopLoss);
        assert_eq!(r.alert_level, AlertLevel::Medium);
    }

    #[test]
    fn trend_reversal_take_profit() {
        let i = AdvisoryInputs {
            drawdown: 0.05,
            is_below_ma: true,
            ..inputs(0.15)
        };
        let r = classify(&i);
        assert_eq!(r.state, AdvisoryState::TrendReversalTakeProfit);
        assert_eq!(r.alert_level, AlertLevel::High);
    }

    #[test]
    fn drawdown_triggered_above_ma() {
        let i = AdvisoryInputs {
            drawdown: 0.08,
            ..inputs(0.12)
        };
        let r = classify(&i);
        assert_eq!(r.state, AdvisoryState::DrawdownTriggered);
        assert_eq!(r.alert_level, AlertLevel::Medium);
    }

    #[test]
    fn strong_hold_high_quality() {
        let i = AdvisoryInputs {
            drawdown: 0.01,
            sharpe: 2.0,
            ..inputs(0.20)
        };
        let r = classify(&i);
        assert_eq!(r.state, AdvisoryState::StrongHoldHighQuality);
        assert_eq!(r.alert_level, AlertLevel::Low);
    }

    #[test]
    fn strong_hold_ordinary_sharpe() {
        let i = AdvisoryInputs {
            sharpe: 1.5,
            ..inputs(0.20)
        };
        assert_eq!(classify(&i).state, AdvisoryState::StrongHold);
    }

    #[test]
    fn below_ma_without_target() {
        let i = AdvisoryInputs {
            is_below_ma: true,
            drawdown: 0.5,
            ..inputs(0.05)
        };
        let r = classify(&i);
        assert_eq!(r.state, AdvisoryState::BelowMovingAverage);
        assert_eq!(r.alert_level, AlertLevel::Low);
    }

    #[test]
    fn accumulating_by_default() {
        let r = classify(&inputs(0.0));
        assert_eq!(r.state, AdvisoryState::AccumulatingNormally);
        assert_eq!(r.alert_level, AlertLevel::Low);
    }

    #[test]
    fn last_rule_is_catch_all() {
        let last = RULES.last().unwrap();
        assert!((last.matches)(&inputs(f64::NAN)));
        assert_eq!(last.state, AdvisoryState::AccumulatingNormally);
    }

    #[test]
    fn notifiable_levels() {
        assert!(AlertLevel::Critical.is_notifiable());
        assert!(AlertLevel::High.is_notifiable());
        assert!(!AlertLevel::Medium.is_notifiable());
        assert!(!AlertLevel::Low.is_notifiable());
    }
}
