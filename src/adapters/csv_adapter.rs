//! CSV file NAV adapter.
//!
//! History lives in `<base>/<holding>.csv` with a `date,nav` header. An
//! optional quotes file (`id,date,nav`) supplies latest NAVs that may be newer
//! than the history files.

use crate::domain::error::FundwatchError;
use crate::domain::nav::{NavPoint, NavSeries};
use crate::ports::data_port::NavDataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
    quotes_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            quotes_path: None,
        }
    }

    pub fn with_quotes(mut self, quotes_path: PathBuf) -> Self {
        self.quotes_path = Some(quotes_path);
        self
    }

    fn csv_path(&self, holding_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", holding_id))
    }

    fn read_quote(&self, path: &Path, holding_id: &str) -> Result<Option<NavPoint>, FundwatchError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FundwatchError::Database {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut latest: Option<NavPoint> = None;
        for result in rdr.records() {
            let record = result.map_err(|e| FundwatchError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;
            if record.get(0).map(str::trim) != Some(holding_id) {
                continue;
            }
            let point = NavPoint::new(parse_date(record.get(1))?, parse_nav(record.get(2))?);
            if latest.is_none_or(|l| point.date >= l.date) {
                latest = Some(point);
            }
        }
        Ok(latest)
    }
}

/// Parses `date,nav` CSV content into a series.
pub fn parse_nav_csv(content: &str) -> Result<NavSeries, FundwatchError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| FundwatchError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;
        let date = parse_date(record.get(0))?;
        let nav = parse_nav(record.get(1))?;
        points.push(NavPoint::new(date, nav));
    }

    Ok(NavSeries::from_points(points))
}

fn parse_date(field: Option<&str>) -> Result<NaiveDate, FundwatchError> {
    let date_str = field.ok_or_else(|| FundwatchError::Database {
        reason: "missing date column".into(),
    })?;
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| FundwatchError::Database {
        reason: format!("invalid date format: {}", e),
    })
}

fn parse_nav(field: Option<&str>) -> Result<f64, FundwatchError> {
    field
        .ok_or_else(|| FundwatchError::Database {
            reason: "missing nav column".into(),
        })?
        .trim()
        .parse()
        .map_err(|e| FundwatchError::Database {
            reason: format!("invalid nav value: {}", e),
        })
}

impl NavDataPort for CsvAdapter {
    fn fetch_nav_series(&self, holding_id: &str) -> Result<NavSeries, FundwatchError> {
        let path = self.csv_path(holding_id);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(NavSeries::empty()),
            Err(e) => {
                return Err(FundwatchError::Database {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };
        parse_nav_csv(&content)
    }

    fn fetch_quote(&self, holding_id: &str) -> Result<Option<NavPoint>, FundwatchError> {
        match &self.quotes_path {
            Some(path) => self.read_quote(path, holding_id),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,nav\n\
            2024-01-16,1.1000\n\
            2024-01-15,1.0500\n\
            2024-01-17,1.1500\n";

        fs::write(path.join("006282.csv"), csv_content).unwrap();
        fs::write(path.join("017091.csv"), "date,nav\n").unwrap();
        fs::write(
            path.join("quotes.csv"),
            "id,date,nav\n006282,2024-01-18,1.2000\n019449,2024-01-18,2.0000\n006282,2024-01-10,0.9000\n",
        )
        .unwrap();

        (dir, path)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_nav_series_sorted() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_nav_series("006282").unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.first().unwrap().date, date(15));
        assert_eq!(series.latest().unwrap().nav, 1.15);
    }

    #[test]
    fn missing_file_is_empty_series() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_nav_series("999999").unwrap().is_empty());
        assert!(adapter.fetch_nav_series("017091").unwrap().is_empty());
    }

    #[test]
    fn invalid_row_is_error() {
        let result = parse_nav_csv("date,nav\n2024-01-15,abc\n");
        assert!(matches!(result, Err(FundwatchError::Database { .. })));
    }

    #[test]
    fn latest_without_quotes_is_last_history_point() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let latest = adapter.fetch_latest_nav("006282").unwrap().unwrap();
        assert_eq!(latest.date, date(17));
    }

    #[test]
    fn newer_quote_wins() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.clone()).with_quotes(path.join("quotes.csv"));

        let latest = adapter.fetch_latest_nav("006282").unwrap().unwrap();
        assert_eq!(latest, NavPoint::new(date(18), 1.2));

        // quote only, no history file
        let latest = adapter.fetch_latest_nav("019449").unwrap().unwrap();
        assert_eq!(latest.nav, 2.0);

        assert!(adapter.fetch_latest_nav("017091").unwrap().is_none());
    }
}
