//! Configuration validation.
//!
//! Parses the portfolio and engine sections into validated values before a
//! cycle runs. A key that is present but malformed is an error, never a default.

use crate::domain::error::FundwatchError;
use crate::domain::holding::{
    DEFAULT_MA_PERIOD, DEFAULT_RISK_FREE_RATE, DEFAULT_RISK_WINDOW, EngineSettings, HoldingConfig,
};
use crate::domain::risk::MIN_RETURN_OBSERVATIONS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const PORTFOLIO_SECTION: &str = "portfolio";
pub const ENGINE_SECTION: &str = "engine";

pub fn holding_section(id: &str) -> String {
    format!("holding.{id}")
}

/// Splits a comma separated holding list, rejecting empty and duplicate ids.
pub fn parse_holding_ids(input: &str) -> Result<Vec<String>, FundwatchError> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let id = token.trim();
        if id.is_empty() {
            return Err(FundwatchError::config_invalid(
                PORTFOLIO_SECTION,
                "holdings",
                "empty holding id in list",
            ));
        }
        if !seen.insert(id.to_string()) {
            return Err(FundwatchError::config_invalid(
                PORTFOLIO_SECTION,
                "holdings",
                format!("duplicate holding id: {id}"),
            ));
        }
        ids.push(id.to_string());
    }

    Ok(ids)
}

/// Parses and validates every configured holding, in list order.
pub fn parse_portfolio(config: &dyn ConfigPort) -> Result<Vec<HoldingConfig>, FundwatchError> {
    let raw = match config.get_string(PORTFOLIO_SECTION, "holdings") {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(FundwatchError::config_missing(PORTFOLIO_SECTION, "holdings")),
    };

    parse_holding_ids(&raw)?
        .into_iter()
        .map(|id| parse_holding(config, id))
        .collect()
}

pub fn parse_engine_settings(config: &dyn ConfigPort) -> Result<EngineSettings, FundwatchError> {
    let window = read_int(config, ENGINE_SECTION, "risk_window")?
        .unwrap_or(DEFAULT_RISK_WINDOW as i64);
    let risk_window = usize::try_from(window)
        .ok()
        .filter(|w| *w >= MIN_RETURN_OBSERVATIONS)
        .ok_or_else(|| {
            FundwatchError::config_invalid(
                ENGINE_SECTION,
                "risk_window",
                format!("risk_window must be at least {MIN_RETURN_OBSERVATIONS}"),
            )
        })?;

    let ma = read_int(config, ENGINE_SECTION, "ma_period")?.unwrap_or(DEFAULT_MA_PERIOD as i64);
    let ma_period = usize::try_from(ma).ok().filter(|m| *m >= 1).ok_or_else(|| {
        FundwatchError::config_invalid(ENGINE_SECTION, "ma_period", "ma_period must be at least 1")
    })?;

    let risk_free_rate = read_double(config, ENGINE_SECTION, "risk_free_rate")?
        .unwrap_or(DEFAULT_RISK_FREE_RATE);
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(FundwatchError::config_invalid(
            ENGINE_SECTION,
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    Ok(EngineSettings {
        risk_window,
        ma_period,
        risk_free_rate,
    })
}

fn parse_holding(config: &dyn ConfigPort, id: String) -> Result<HoldingConfig, FundwatchError> {
    let section = holding_section(&id);
    if !config.has_section(&section) {
        return Err(FundwatchError::config_missing(&section, "name"));
    }

    let init_cost = require_positive(config, &section, "init_cost")?;
    let init_shares = require_non_negative(config, &section, "init_shares")?;
    let invest_amount = require_non_negative(config, &section, "invest_amount")?;

    let interval = read_int(config, &section, "invest_interval_days")?
        .ok_or_else(|| FundwatchError::config_missing(&section, "invest_interval_days"))?;
    let invest_interval_days = u32::try_from(interval)
        .ok()
        .filter(|d| *d >= 1)
        .ok_or_else(|| {
            FundwatchError::config_invalid(
                &section,
                "invest_interval_days",
                format!("invest_interval_days must be between 1 and {}", u32::MAX),
            )
        })?;

    let target = require_positive(config, &section, "target")?;

    let callback = read_double(config, &section, "callback")?
        .ok_or_else(|| FundwatchError::config_missing(&section, "callback"))?;
    if callback <= 0.0 || callback >= 1.0 {
        return Err(FundwatchError::config_invalid(
            &section,
            "callback",
            "callback must be between 0 and 1",
        ));
    }

    let start_date = parse_date(config.get_string(&section, "start_date").as_deref(), &section, "start_date")?;

    Ok(HoldingConfig {
        name: config.get_string(&section, "name").unwrap_or_else(|| id.clone()),
        init_cost,
        init_shares,
        invest_amount,
        invest_interval_days,
        target,
        callback,
        start_date,
        id,
    })
}

/// Integer value of `key`, `None` when absent. Present but unparsable is
/// `ConfigInvalid`.
pub fn read_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, FundwatchError> {
    config
        .get_string(section, key)
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                FundwatchError::config_invalid(section, key, format!("{key} is not an integer: {raw}"))
            })
        })
        .transpose()
}

/// Finite number value of `key`, `None` when absent.
pub fn read_double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, FundwatchError> {
    config
        .get_string(section, key)
        .map(|raw| match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(FundwatchError::config_invalid(
                section,
                key,
                format!("{key} is not a number: {raw}"),
            )),
        })
        .transpose()
}

fn require_positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, FundwatchError> {
    let value = read_double(config, section, key)?
        .ok_or_else(|| FundwatchError::config_missing(section, key))?;
    if value <= 0.0 {
        return Err(FundwatchError::config_invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(value)
}

/// Absent means 0.
fn require_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<f64, FundwatchError> {
    let value = read_double(config, section, key)?.unwrap_or(0.0);
    if value < 0.0 {
        return Err(FundwatchError::config_invalid(
            section,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(value)
}

pub fn parse_date(value: Option<&str>, section: &str, key: &str) -> Result<NaiveDate, FundwatchError> {
    match value {
        None => Err(FundwatchError::config_missing(section, key)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FundwatchError::config_invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))
        }),
    }
}
