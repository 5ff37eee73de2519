//! Per-holding high-water marks and drawdown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted map of holding id to the highest NAV seen. Values never decrease.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeakState {
    peaks: BTreeMap<String, f64>,
}

impl PeakState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds state from raw values, dropping entries that are negative or not
    /// finite. Returns the names of dropped entries alongside.
    pub fn from_raw(raw: BTreeMap<String, f64>) -> (Self, Vec<String>) {
        let mut peaks = BTreeMap::new();
        let mut rejected = Vec::new();
        for (id, value) in raw {
            if value.is_finite() && value >= 0.0 {
                peaks.insert(id, value);
            } else {
                rejected.push(id);
            }
        }
        (Self { peaks }, rejected)
    }

    /// Stored peak, 0.0 for unseen holdings.
    pub fn peak(&self, id: &str) -> f64 {
        self.peaks.get(id).copied().unwrap_or(0.0)
    }

    /// Applies `peak = max(peak, nav)` and returns the new peak.
    pub fn observe(&mut self, id: &str, nav: f64) -> f64 {
        let entry = self.peaks.entry(id.to_string()).or_insert(0.0);
        if nav.is_finite() && nav > *entry {
            *entry = nav;
        }
        *entry
    }

    /// Updates the peak and returns `(peak, drawdown)` for this observation.
    pub fn observe_drawdown(&mut self, id: &str, nav: f64) -> (f64, f64) {
        let peak = self.observe(id, nav);
        (peak, drawdown(peak, nav))
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.peaks.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// `(peak - nav) / peak`, clamped to `[0, 1]`; 0 when there is no peak yet.
pub fn drawdown(peak: f64, nav: f64) -> f64 {
    if peak > 0.0 {
        ((peak - nav) / peak).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
