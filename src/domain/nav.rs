//! Net-asset-value history for a single holding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One published NAV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: f64) -> Self {
        Self { date, nav }
    }
}

/// NAV history ordered ascending by date with no duplicate dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    /// Builds a series from points in any order. Points are sorted by date and,
    /// when a date repeats, the last supplied value for that date is kept.
    pub fn from_points(mut points: Vec<NavPoint>) -> Self {
        // stable sort keeps supply order within a date
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<NavPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&NavPoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    /// Most recent point dated on or before `date`.
    pub fn on_or_before(&self, date: NaiveDate) -> Option<&NavPoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            None
        } else {
            Some(&self.points[idx - 1])
        }
    }

    /// Points dated on or before `date`.
    pub fn truncated_to(&self, date: NaiveDate) -> NavSeries {
        let idx = self.points.partition_point(|p| p.date <= date);
        NavSeries {
            points: self.points[..idx].to_vec(),
        }
    }

    pub fn nav_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].nav)
    }

    /// Simple daily returns `nav[t] / nav[t-1] - 1`. Pairs with a non-positive
    /// previous NAV are skipped.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .filter(|w| w[0].nav > 0.0)
            .map(|w| w[1].nav / w[0].nav - 1.0)
            .collect()
    }

    /// Simple moving average of the last `period` NAVs, `None` until enough
    /// history exists.
    pub fn moving_average(&self, period: usize) -> Option<f64> {
        if period == 0 || self.points.len() < period {
            return None;
        }
        let window = &self.points[self.points.len() - period..];
        Some(window.iter().map(|p| p.nav).sum::<f64>() / period as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(values: &[(u32, f64)]) -> NavSeries {
        NavSeries::from_points(values.iter().map(|&(day, nav)| NavPoint::new(d(day), nav)).collect())
    }

    #[test]
    fn from_points_sorts_and_dedupes() {
        let s = NavSeries::from_points(vec![
            NavPoint::new(d(3), 1.3),
            NavPoint::new(d(1), 1.1),
            NavPoint::new(d(3), 1.35),
            NavPoint::new(d(2), 1.2),
        ]);
        let dates: Vec<_> = s.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
        assert_eq!(s.nav_on(d(3)), Some(1.35));
    }

    #[test]
    fn on_or_before_picks_most_recent() {
        let s = series(&[(4, 1.0), (6, 1.1), (9, 1.2)]);
        assert!(s.on_or_before(d(3)).is_none());
        assert_eq!(s.on_or_before(d(4)).unwrap().nav, 1.0);
        assert_eq!(s.on_or_before(d(8)).unwrap().nav, 1.1);
        assert_eq!(s.on_or_before(d(20)).unwrap().nav, 1.2);
    }

    #[test]
    fn truncated_to_drops_future_points() {
        let s = series(&[(1, 1.0), (2, 1.1), (3, 1.2)]);
        let t = s.truncated_to(d(2));
        assert_eq!(t.len(), 2);
        assert_eq!(t.latest().unwrap().date, d(2));
    }

    #[test]
    fn daily_returns_basic() {
        let s = series(&[(1, 1.0), (2, 1.1), (3, 0.99)]);
        let r = s.daily_returns();
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn daily_returns_skip_zero_previous() {
        let s = series(&[(1, 0.0), (2, 1.0), (3, 1.5)]);
        let r = s.daily_returns();
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn moving_average_needs_full_window() {
        let s = series(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        assert_eq!(s.moving_average(5), None);
        assert_eq!(s.moving_average(0), None);
        assert!((s.moving_average(2).unwrap() - 3.5).abs() < 1e-12);
        assert!((s.moving_average(4).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn empty_series() {
        let s = NavSeries::empty();
        assert!(s.is_empty());
        assert!(s.latest().is_none());
        assert!(s.daily_returns().is_empty());
    }
}
