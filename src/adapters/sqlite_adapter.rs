//! SQLite NAV store.

use crate::domain::error::FundwatchError;
use crate::domain::nav::{NavPoint, NavSeries};
use crate::ports::data_port::NavDataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> FundwatchError {
    FundwatchError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, FundwatchError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| FundwatchError::Database {
        reason: e.to_string(),
    })
}

impl SqliteAdapter {
    /// Opens (creating if needed) the database file and initialises the schema.
    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self, FundwatchError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|e: r2d2::Error| FundwatchError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, FundwatchError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FundwatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FundwatchError> {
        self.pool.get().map_err(|e: r2d2::Error| FundwatchError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), FundwatchError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS nav_history (
                holding_id TEXT NOT NULL,
                date TEXT NOT NULL,
                nav REAL NOT NULL,
                PRIMARY KEY (holding_id, date)
            );
            CREATE INDEX IF NOT EXISTS idx_nav_history_date ON nav_history(date);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Upserts points for one holding in a single transaction.
    pub fn insert_points(&self, holding_id: &str, points: &[NavPoint]) -> Result<usize, FundwatchError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO nav_history (holding_id, date, nav) VALUES (?1, ?2, ?3)",
                params![
                    holding_id,
                    point.date.format("%Y-%m-%d").to_string(),
                    point.nav
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(points.len())
    }

    pub fn get_data_range(
        &self,
        holding_id: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FundwatchError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM nav_history WHERE holding_id = ?1",
                params![holding_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_stored_date(&min_str)?,
                parse_stored_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

impl NavDataPort for SqliteAdapter {
    fn fetch_nav_series(&self, holding_id: &str) -> Result<NavSeries, FundwatchError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT date, nav FROM nav_history
                 WHERE holding_id = ?1
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![holding_id], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(NavPoint::new(date, row.get(1)?))
            })
            .map_err(query_err)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(query_err)?);
        }

        Ok(NavSeries::from_points(points))
    }
}
