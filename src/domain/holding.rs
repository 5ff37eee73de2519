//! Portfolio configuration: holdings and engine settings.

use chrono::NaiveDate;

pub const DEFAULT_RISK_WINDOW: usize = 60;
pub const DEFAULT_MA_PERIOD: usize = 20;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.025;

/// Static description of one fund holding and its investment plan.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingConfig {
    pub id: String,
    pub name: String,
    pub init_cost: f64,
    pub init_shares: f64,
    pub invest_amount: f64,
    pub invest_interval_days: u32,
    /// Profit rate at which take-profit logic starts to apply.
    pub target: f64,
    /// Drawdown from peak tolerated once the target is reached.
    pub callback: f64,
    pub start_date: NaiveDate,
}

impl HoldingConfig {
    pub fn init_total_cost(&self) -> f64 {
        self.init_shares * self.init_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub risk_window: usize,
    pub ma_period: usize,
    pub risk_free_rate: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            risk_window: DEFAULT_RISK_WINDOW,
            ma_period: DEFAULT_MA_PERIOD,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

/// Immutable set of holdings evaluated in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    pub holdings: Vec<HoldingConfig>,
}

impl Portfolio {
    pub fn new(holdings: Vec<HoldingConfig>) -> Self {
        Self { holdings }
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.holdings.iter().map(|h| h.id.as_str())
    }
}
