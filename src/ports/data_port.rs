//! NAV data provider port.

use crate::domain::engine::current_point;
use crate::domain::error::FundwatchError;
use crate::domain::nav::{NavPoint, NavSeries};

/// Source of NAV history per holding.
///
/// An empty series means the provider has nothing for the holding; errors are
/// reserved for a provider that could not be queried at all. The engine treats
/// both as unavailability for that holding only.
pub trait NavDataPort {
    fn fetch_nav_series(&self, holding_id: &str) -> Result<NavSeries, FundwatchError>;

    /// Quote from a feed separate from the history, if the provider has one.
    fn fetch_quote(&self, _holding_id: &str) -> Result<Option<NavPoint>, FundwatchError> {
        Ok(None)
    }

    /// Latest known NAV: the newer of the last history point and the quote,
    /// or the quote alone when history is missing.
    fn fetch_latest_nav(&self, holding_id: &str) -> Result<Option<NavPoint>, FundwatchError> {
        let series = self.fetch_nav_series(holding_id)?;
        Ok(current_point(&series, self.fetch_quote(holding_id)?))
    }
}
