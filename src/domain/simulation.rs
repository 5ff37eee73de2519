//! Historical replay of a periodic investment plan.
//!
//! Scheduled purchase dates are `start_date + k * interval` for `k = 1, 2, ...`
//! up to and including the evaluation date. Each purchase is priced at the most
//! recent NAV dated on or before the scheduled date. Purchases scheduled before
//! the first available NAV are skipped.
//!
//! With no history at all, the plan is approximated from elapsed calendar days
//! and every purchase is priced at the current NAV.

use crate::domain::holding::HoldingConfig;
use crate::domain::nav::NavSeries;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationResult {
    pub total_shares: f64,
    pub total_cost: f64,
    pub average_cost: f64,
    pub purchases: usize,
    /// Scheduled purchases with no NAV on or before their date.
    pub skipped_purchases: usize,
    /// True when the calendar-only approximation was used.
    pub calendar_fallback: bool,
}

impl SimulationResult {
    pub fn is_degraded(&self) -> bool {
        self.calendar_fallback || self.skipped_purchases > 0
    }

    fn finish(holding: &HoldingConfig, shares: f64, cost: f64, purchases: usize) -> Self {
        let average_cost = if shares > 0.0 {
            cost / shares
        } else {
            holding.init_cost
        };
        SimulationResult {
            total_shares: shares,
            total_cost: cost,
            average_cost,
            purchases,
            skipped_purchases: 0,
            calendar_fallback: false,
        }
    }
}

/// Replays the holding's schedule over `series` up to `as_of`.
///
/// `current_nav` is only used when `series` is empty.
pub fn simulate_dca(
    holding: &HoldingConfig,
    series: &NavSeries,
    as_of: NaiveDate,
    current_nav: f64,
) -> SimulationResult {
    if series.is_empty() {
        return simulate_calendar_only(holding, as_of, current_nav);
    }

    let interval = Duration::days(i64::from(holding.invest_interval_days.max(1)));
    let mut shares = holding.init_shares;
    let mut cost = holding.init_total_cost();
    let mut purchases = 0usize;
    let mut skipped = 0usize;

    let mut scheduled = holding.start_date + interval;
    while scheduled <= as_of {
        match series.on_or_before(scheduled) {
            Some(point) if point.nav > 0.0 => {
                shares += holding.invest_amount / point.nav;
                cost += holding.invest_amount;
                purchases += 1;
            }
            _ => skipped += 1,
        }
        scheduled += interval;
    }

    let mut result = SimulationResult::finish(holding, shares, cost, purchases);
    result.skipped_purchases = skipped;
    result
}

/// Purchase count from elapsed days alone, every purchase priced at `current_nav`.
pub fn simulate_calendar_only(
    holding: &HoldingConfig,
    as_of: NaiveDate,
    current_nav: f64,
) -> SimulationResult {
    let days_passed = (as_of - holding.start_date).num_days();
    let interval = i64::from(holding.invest_interval_days.max(1));
    let times = if days_passed >= 0 && current_nav > 0.0 {
        (days_passed / interval + 1) as usize
    } else {
        0
    };

    // times > 0 implies current_nav > 0
    let shares = if times > 0 {
        holding.init_shares + times as f64 * holding.invest_amount / current_nav
    } else {
        holding.init_shares
    };
    let cost = holding.init_total_cost() + times as f64 * holding.invest_amount;

    let mut result = SimulationResult::finish(holding, shares, cost, times);
    result.calendar_fallback = true;
    result
}
