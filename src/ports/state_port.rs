//! Persistence ports for peak state and cycle results.

use crate::domain::engine::CycleResult;
use crate::domain::error::FundwatchError;
use crate::domain::peak::PeakState;

/// Outcome of loading peak state.
#[derive(Debug, Clone, PartialEq)]
pub enum PeakLoad {
    Loaded(PeakState),
    /// Nothing stored yet.
    Missing,
    /// Stored state was unreadable or invalid; defaults apply.
    Corrupt { reason: String },
}

pub trait PeakStatePort {
    fn load(&self) -> PeakLoad;
    fn save(&self, state: &PeakState) -> Result<(), FundwatchError>;
}

pub trait CycleResultPort {
    fn write(&self, result: &CycleResult) -> Result<(), FundwatchError>;
}
