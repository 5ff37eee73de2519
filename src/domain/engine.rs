//! Evaluation cycle: fetch, simulate, track peaks, classify, correlate.
//!
//! Holdings are evaluated one after another. A holding with no usable NAV is
//! recorded as skipped and the cycle moves on; missing history or too few
//! returns only degrade the affected metrics.

use crate::domain::advisory::{self, AdvisoryInputs, AdvisoryResult, AlertLevel};
use crate::domain::correlation::{self, CorrelationMatrix, HighCorrelationPair};
use crate::domain::holding::{EngineSettings, HoldingConfig, Portfolio};
use crate::domain::nav::{NavPoint, NavSeries};
use crate::domain::peak::PeakState;
use crate::domain::risk::{self, MIN_RETURN_OBSERVATIONS, RiskSnapshot};
use crate::domain::simulation::{self, SimulationResult};
use crate::domain::threshold::DynamicThresholds;
use crate::ports::data_port::NavDataPort;
use crate::ports::state_port::{PeakLoad, PeakStatePort};
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Metrics that fell back to an approximation or a neutral value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    InsufficientHistory {
        returns: usize,
    },
    ComputationDegraded {
        skipped_purchases: usize,
        calendar_fallback: bool,
    },
    MovingAverageUnavailable {
        observations: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingEvaluation {
    pub id: String,
    pub name: String,
    pub nav: f64,
    pub nav_date: NaiveDate,
    pub moving_average: Option<f64>,
    pub is_below_ma: bool,
    pub simulation: SimulationResult,
    pub profit_rate: f64,
    pub profit_amount: f64,
    pub peak: f64,
    pub drawdown: f64,
    pub risk: RiskSnapshot,
    pub thresholds: DynamicThresholds,
    pub advisory: AdvisoryResult,
    pub degradations: Vec<Degradation>,
}

impl HoldingEvaluation {
    pub fn alert_level(&self) -> AlertLevel {
        self.advisory.alert_level
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    DataUnavailable { detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedHolding {
    pub id: String,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoldingOutcome {
    Evaluated(Box<HoldingEvaluation>),
    Skipped(SkippedHolding),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    pub timestamp: DateTime<FixedOffset>,
    pub as_of: NaiveDate,
    pub outcomes: Vec<HoldingOutcome>,
    pub correlation: CorrelationMatrix,
    pub high_correlation_pairs: Vec<HighCorrelationPair>,
    /// Set when stored peak state could not be used and defaults were applied.
    pub peak_state_reset: Option<String>,
}

impl CycleResult {
    pub fn evaluations(&self) -> impl Iterator<Item = &HoldingEvaluation> {
        self.outcomes.iter().filter_map(|o| match o {
            HoldingOutcome::Evaluated(e) => Some(e.as_ref()),
            HoldingOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedHolding> {
        self.outcomes.iter().filter_map(|o| match o {
            HoldingOutcome::Skipped(s) => Some(s),
            HoldingOutcome::Evaluated(_) => None,
        })
    }

    pub fn evaluation(&self, id: &str) -> Option<&HoldingEvaluation> {
        self.evaluations().find(|e| e.id == id)
    }

    /// Holdings whose alert level warrants a notification, in portfolio order.
    pub fn alerts(&self) -> Vec<&HoldingEvaluation> {
        self.evaluations()
            .filter(|e| e.alert_level().is_notifiable())
            .collect()
    }

    pub fn all_skipped(&self) -> bool {
        !self.outcomes.is_empty() && self.evaluations().next().is_none()
    }
}

pub struct Engine<'a> {
    portfolio: &'a Portfolio,
    settings: EngineSettings,
    data_port: &'a dyn NavDataPort,
}

impl<'a> Engine<'a> {
    pub fn new(
        portfolio: &'a Portfolio,
        settings: EngineSettings,
        data_port: &'a dyn NavDataPort,
    ) -> Self {
        Self {
            portfolio,
            settings,
            data_port,
        }
    }

    /// Full cycle against a peak store: load, evaluate every holding, save.
    ///
    /// A failed save is logged; the returned result is unaffected.
    pub fn run_cycle(&self, store: &dyn PeakStatePort, as_of: NaiveDate) -> CycleResult {
        let (mut peaks, reset) = load_peaks(store);
        let mut result = self.evaluate(&mut peaks, as_of);
        result.peak_state_reset = reset;

        if let Err(e) = store.save(&peaks) {
            warn!(error = %e, "failed to save peak state");
        }
        result
    }

    /// Like [`Engine::run_cycle`] but leaves the store untouched.
    pub fn preview(&self, store: &dyn PeakStatePort, as_of: NaiveDate) -> CycleResult {
        let (mut peaks, reset) = load_peaks(store);
        let mut result = self.evaluate(&mut peaks, as_of);
        result.peak_state_reset = reset;
        result
    }

    /// Evaluates every holding against `peaks`, updating it in place.
    pub fn evaluate(&self, peaks: &mut PeakState, as_of: NaiveDate) -> CycleResult {
        let mut outcomes = Vec::with_capacity(self.portfolio.len());
        let mut histories: Vec<(&str, NavSeries)> = Vec::with_capacity(self.portfolio.len());

        for holding in &self.portfolio.holdings {
            let (series, current) = self.fetch_history(holding, as_of);

            let outcome = match current {
                Some(point) if point.nav > 0.0 => {
                    let history = with_quote(&series, point);
                    let evaluation =
                        evaluate_holding(holding, &series, &history, point, peaks, &self.settings, as_of);
                    info!(
                        holding = %holding.id,
                        nav = evaluation.nav,
                        profit_rate = evaluation.profit_rate,
                        drawdown = evaluation.drawdown,
                        state = ?evaluation.advisory.state,
                        "evaluated holding"
                    );
                    histories.push((holding.id.as_str(), history));
                    HoldingOutcome::Evaluated(Box::new(evaluation))
                }
                Some(point) => {
                    warn!(holding = %holding.id, nav = point.nav, "non-positive NAV, skipping");
                    HoldingOutcome::Skipped(skipped(holding, format!("non-positive NAV {}", point.nav)))
                }
                None => {
                    warn!(holding = %holding.id, "no NAV available, skipping");
                    HoldingOutcome::Skipped(skipped(holding, "no NAV on or before evaluation date".into()))
                }
            };
            outcomes.push(outcome);
        }

        let refs: Vec<(&str, &NavSeries)> = histories.iter().map(|(id, s)| (*id, s)).collect();
        let correlation = correlation::correlate(&refs);
        let high_correlation_pairs = correlation.high_correlation_pairs();
        for pair in &high_correlation_pairs {
            info!(
                a = %pair.holding_a,
                b = %pair.holding_b,
                correlation = pair.correlation,
                "highly correlated holdings"
            );
        }

        CycleResult {
            timestamp: Local::now().fixed_offset(),
            as_of,
            outcomes,
            correlation,
            high_correlation_pairs,
            peak_state_reset: None,
        }
    }

    /// Histories for every holding, each extended by a newer quote, for
    /// correlation alone.
    pub fn correlation(&self, as_of: NaiveDate) -> CorrelationMatrix {
        let histories: Vec<(&str, NavSeries)> = self
            .portfolio
            .holdings
            .iter()
            .map(|h| {
                let (series, current) = self.fetch_history(h, as_of);
                let history = match current {
                    Some(point) => with_quote(&series, point),
                    None => series,
                };
                (h.id.as_str(), history)
            })
            .collect();
        let refs: Vec<(&str, &NavSeries)> = histories.iter().map(|(id, s)| (*id, s)).collect();
        correlation::correlate(&refs)
    }

    /// History up to `as_of` and the current point: the newest of the last
    /// history point and the provider's quote.
    fn fetch_history(&self, holding: &HoldingConfig, as_of: NaiveDate) -> (NavSeries, Option<NavPoint>) {
        let series = match self.data_port.fetch_nav_series(&holding.id) {
            Ok(series) => series.truncated_to(as_of),
            Err(e) => {
                warn!(holding = %holding.id, error = %e, "NAV history unavailable");
                NavSeries::empty()
            }
        };
        let quote = match self.data_port.fetch_quote(&holding.id) {
            Ok(point) => point.filter(|p| p.date <= as_of),
            Err(e) => {
                warn!(holding = %holding.id, error = %e, "latest NAV unavailable");
                None
            }
        };
        let current = current_point(&series, quote);
        (series, current)
    }
}

/// Stored peaks, or a fresh state plus the reason when the stored one is
/// unusable.
pub fn load_peaks(store: &dyn PeakStatePort) -> (PeakState, Option<String>) {
    match store.load() {
        PeakLoad::Loaded(state) => (state, None),
        PeakLoad::Missing => {
            debug!("no stored peak state, starting fresh");
            (PeakState::new(), None)
        }
        PeakLoad::Corrupt { reason } => {
            warn!(%reason, "stored peak state unusable, resetting to defaults");
            (PeakState::new(), Some(reason))
        }
    }
}

fn skipped(holding: &HoldingConfig, detail: String) -> SkippedHolding {
    SkippedHolding {
        id: holding.id.clone(),
        name: holding.name.clone(),
        reason: SkipReason::DataUnavailable { detail },
    }
}

/// Newest of the history's last point and the separate quote.
pub(crate) fn current_point(series: &NavSeries, quote: Option<NavPoint>) -> Option<NavPoint> {
    match (series.latest().copied(), quote) {
        (Some(last), Some(q)) if q.date > last.date => Some(q),
        (Some(last), _) => Some(last),
        (None, q) => q,
    }
}

fn with_quote(series: &NavSeries, point: NavPoint) -> NavSeries {
    match series.latest() {
        Some(last) if last.date >= point.date => series.clone(),
        _ => {
            let mut points = series.points().to_vec();
            points.push(point);
            NavSeries::from_points(points)
        }
    }
}

/// Runs the per-holding pipeline. `series` is the provider's history (used
/// for the purchase replay), `history` additionally carries a newer quote.
pub fn evaluate_holding(
    holding: &HoldingConfig,
    series: &NavSeries,
    history: &NavSeries,
    current: NavPoint,
    peaks: &mut PeakState,
    settings: &EngineSettings,
    as_of: NaiveDate,
) -> HoldingEvaluation {
    let nav = current.nav;
    let mut degradations = Vec::new();

    let sim = if series.is_empty() {
        simulation::simulate_calendar_only(holding, as_of, nav)
    } else {
        simulation::simulate_dca(holding, history, as_of, nav)
    };
    if sim.is_degraded() {
        debug!(
            holding = %holding.id,
            skipped = sim.skipped_purchases,
            calendar_fallback = sim.calendar_fallback,
            "purchase replay degraded"
        );
        degradations.push(Degradation::ComputationDegraded {
            skipped_purchases: sim.skipped_purchases,
            calendar_fallback: sim.calendar_fallback,
        });
    }

    let moving_average = history.moving_average(settings.ma_period);
    if moving_average.is_none() {
        degradations.push(Degradation::MovingAverageUnavailable {
            observations: history.len(),
        });
    }
    let is_below_ma = moving_average.is_some_and(|ma| nav < ma);

    let returns = history.daily_returns();
    let usable_returns = risk::usable_returns(&returns, settings.risk_window);
    let risk = RiskSnapshot::compute(&returns, settings.risk_window, settings.risk_free_rate);
    if usable_returns < MIN_RETURN_OBSERVATIONS {
        degradations.push(Degradation::InsufficientHistory {
            returns: usable_returns,
        });
    }

    let (peak, drawdown) = peaks.observe_drawdown(&holding.id, nav);
    let thresholds = DynamicThresholds::adjust(
        holding.target,
        holding.callback,
        risk.annualized_volatility,
    );

    let average_cost = sim.average_cost;
    let profit_rate = if average_cost > 0.0 {
        (nav - average_cost) / average_cost
    } else {
        0.0
    };
    let profit_amount = (nav - average_cost) * sim.total_shares;

    let advisory = advisory::classify(&AdvisoryInputs {
        profit_rate,
        drawdown,
        is_below_ma,
        dynamic_target: thresholds.target,
        dynamic_callback: thresholds.callback,
        sharpe: risk.sharpe,
    });

    HoldingEvaluation {
        id: holding.id.clone(),
        name: holding.name.clone(),
        nav,
        nav_date: current.date,
        moving_average,
        is_below_ma,
        simulation: sim,
        profit_rate,
        profit_amount,
        peak,
        drawdown,
        risk,
        thresholds,
        advisory,
        degradations,
    }
}
