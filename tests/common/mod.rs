#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use fundwatch::domain::error::FundwatchError;
use fundwatch::domain::holding::HoldingConfig;
pub use fundwatch::domain::nav::{NavPoint, NavSeries};
use fundwatch::domain::peak::PeakState;
use fundwatch::ports::data_port::NavDataPort;
use fundwatch::ports::state_port::{PeakLoad, PeakStatePort};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct MockNavPort {
    pub series: HashMap<String, NavSeries>,
    pub quotes: HashMap<String, NavPoint>,
    pub errors: HashMap<String, String>,
    pub series_fetches: Cell<usize>,
}

impl MockNavPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
            series_fetches: Cell::new(0),
        }
    }

    pub fn with_series(mut self, id: &str, series: NavSeries) -> Self {
        self.series.insert(id.to_string(), series);
        self
    }

    pub fn with_quote(mut self, id: &str, date: NaiveDate, nav: f64) -> Self {
        self.quotes.insert(id.to_string(), NavPoint::new(date, nav));
        self
    }

    pub fn with_error(mut self, id: &str, reason: &str) -> Self {
        self.errors.insert(id.to_string(), reason.to_string());
        self
    }
}

impl NavDataPort for MockNavPort {
    fn fetch_nav_series(&self, holding_id: &str) -> Result<NavSeries, FundwatchError> {
        self.series_fetches.set(self.series_fetches.get() + 1);
        if let Some(reason) = self.errors.get(holding_id) {
            return Err(FundwatchError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.series.get(holding_id).cloned().unwrap_or_default())
    }

    fn fetch_quote(&self, holding_id: &str) -> Result<Option<NavPoint>, FundwatchError> {
        Ok(self.quotes.get(holding_id).copied())
    }
}

/// Peak store kept in memory; counts saves and can start corrupt.
pub struct MemoryPeakStore {
    pub state: RefCell<Option<PeakState>>,
    pub corrupt: RefCell<Option<String>>,
    pub saves: Cell<usize>,
}

impl MemoryPeakStore {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(None),
            corrupt: RefCell::new(None),
            saves: Cell::new(0),
        }
    }

    pub fn corrupt(reason: &str) -> Self {
        let store = Self::new();
        *store.corrupt.borrow_mut() = Some(reason.to_string());
        store
    }

    pub fn peak(&self, id: &str) -> f64 {
        self.state
            .borrow()
            .as_ref()
            .map(|s| s.peak(id))
            .unwrap_or(0.0)
    }
}

impl PeakStatePort for MemoryPeakStore {
    fn load(&self) -> PeakLoad {
        if let Some(reason) = self.corrupt.borrow_mut().take() {
            return PeakLoad::Corrupt { reason };
        }
        match self.state.borrow().as_ref() {
            Some(state) => PeakLoad::Loaded(state.clone()),
            None => PeakLoad::Missing,
        }
    }

    fn save(&self, state: &PeakState) -> Result<(), FundwatchError> {
        *self.state.borrow_mut() = Some(state.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily points starting at `start`.
pub fn daily_series(start: NaiveDate, navs: &[f64]) -> NavSeries {
    NavSeries::from_points(
        navs.iter()
            .enumerate()
            .map(|(i, &nav)| NavPoint::new(start + Duration::days(i as i64), nav))
            .collect(),
    )
}

pub fn flat_series(start: NaiveDate, days: usize, nav: f64) -> NavSeries {
    daily_series(start, &vec![nav; days])
}

/// NAVs following a repeating return pattern, for non-degenerate volatility.
pub fn zigzag_series(start: NaiveDate, days: usize, base: f64, step: f64) -> NavSeries {
    let mut nav = base;
    let mut navs = Vec::with_capacity(days);
    for i in 0..days {
        navs.push(nav);
        nav *= if i % 2 == 0 { 1.0 + step } else { 1.0 - step / 2.0 };
    }
    daily_series(start, &navs)
}

pub fn make_holding(id: &str, start_date: NaiveDate) -> HoldingConfig {
    HoldingConfig {
        id: id.to_string(),
        name: format!("Fund {id}"),
        init_cost: 1.0,
        init_shares: 1000.0,
        invest_amount: 0.0,
        invest_interval_days: 1,
        target: 0.12,
        callback: 0.05,
        start_date,
    }
}
