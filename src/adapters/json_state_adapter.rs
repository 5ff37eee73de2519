//! JSON file persistence for peak state and cycle results.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers never see a partial file.

use crate::domain::advisory::{AdvisoryState, AlertLevel};
use crate::domain::engine::{CycleResult, Degradation, HoldingOutcome, SkipReason};
use crate::domain::correlation::HighCorrelationPair;
use crate::domain::error::FundwatchError;
use crate::domain::peak::PeakState;
use crate::ports::state_port::{CycleResultPort, PeakLoad, PeakStatePort};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

fn persistence_err(path: &Path, reason: impl ToString) -> FundwatchError {
    FundwatchError::Persistence {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Serializes `value` as pretty JSON and atomically replaces `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), FundwatchError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| persistence_err(path, e))?;

    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| persistence_err(path, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.write_all(b"\n"))
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| persistence_err(path, e))?;
    tmp.persist(path).map_err(|e| persistence_err(path, e.error))?;
    Ok(())
}

pub struct JsonPeakStore {
    path: PathBuf,
}

impl JsonPeakStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PeakStatePort for JsonPeakStore {
    fn load(&self) -> PeakLoad {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return PeakLoad::Missing,
            Err(e) => {
                return PeakLoad::Corrupt {
                    reason: format!("failed to read {}: {}", self.path.display(), e),
                };
            }
        };

        let raw: BTreeMap<String, f64> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                return PeakLoad::Corrupt {
                    reason: format!("invalid JSON in {}: {}", self.path.display(), e),
                };
            }
        };

        let (state, rejected) = PeakState::from_raw(raw);
        if rejected.is_empty() {
            PeakLoad::Loaded(state)
        } else {
            warn!(?rejected, "peak state holds invalid values");
            PeakLoad::Corrupt {
                reason: format!("invalid peak values for {}", rejected.join(", ")),
            }
        }
    }

    fn save(&self, state: &PeakState) -> Result<(), FundwatchError> {
        write_json_atomic(&self.path, state)
    }
}

#[derive(Debug, Serialize)]
struct HoldingRecord<'a> {
    code: &'a str,
    name: &'a str,
    nav: f64,
    nav_date: String,
    ma20: Option<f64>,
    cost: f64,
    shares: f64,
    profit_rate: f64,
    profit_amount: f64,
    peak: f64,
    drawdown: f64,
    sharpe: f64,
    volatility: f64,
    annualized_return: f64,
    target: f64,
    callback: f64,
    advice: String,
    state: AdvisoryState,
    alert_level: AlertLevel,
    degradations: &'a [Degradation],
}

#[derive(Debug, Serialize)]
struct SkippedRecord<'a> {
    code: &'a str,
    name: &'a str,
    reason: &'a SkipReason,
}

#[derive(Debug, Serialize)]
struct CycleRecord<'a> {
    timestamp: String,
    as_of: String,
    results: Vec<HoldingRecord<'a>>,
    skipped: Vec<SkippedRecord<'a>>,
    high_correlation_pairs: &'a [HighCorrelationPair],
    #[serde(skip_serializing_if = "Option::is_none")]
    peak_state_reset: Option<&'a str>,
}

impl<'a> CycleRecord<'a> {
    fn from_result(result: &'a CycleResult) -> Self {
        let mut results = Vec::new();
        let mut skipped = Vec::new();
        for outcome in &result.outcomes {
            match outcome {
                HoldingOutcome::Evaluated(e) => results.push(HoldingRecord {
                    code: &e.id,
                    name: &e.name,
                    nav: e.nav,
                    nav_date: e.nav_date.format("%Y-%m-%d").to_string(),
                    ma20: e.moving_average,
                    cost: e.simulation.average_cost,
                    shares: e.simulation.total_shares,
                    profit_rate: e.profit_rate,
                    profit_amount: e.profit_amount,
                    peak: e.peak,
                    drawdown: e.drawdown,
                    sharpe: e.risk.sharpe,
                    volatility: e.risk.annualized_volatility,
                    annualized_return: e.risk.annualized_return,
                    target: e.thresholds.target,
                    callback: e.thresholds.callback,
                    advice: e.advisory.state.to_string(),
                    state: e.advisory.state,
                    alert_level: e.advisory.alert_level,
                    degradations: &e.degradations,
                }),
                HoldingOutcome::Skipped(s) => skipped.push(SkippedRecord {
                    code: &s.id,
                    name: &s.name,
                    reason: &s.reason,
                }),
            }
        }

        CycleRecord {
            timestamp: result.timestamp.to_rfc3339(),
            as_of: result.as_of.format("%Y-%m-%d").to_string(),
            results,
            skipped,
            high_correlation_pairs: &result.high_correlation_pairs,
            peak_state_reset: result.peak_state_reset.as_deref(),
        }
    }
}

pub struct JsonResultWriter {
    path: PathBuf,
}

impl JsonResultWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CycleResultPort for JsonResultWriter {
    fn write(&self, result: &CycleResult) -> Result<(), FundwatchError> {
        write_json_atomic(&self.path, &CycleRecord::from_result(result))
    }
}
