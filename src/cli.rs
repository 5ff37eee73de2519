//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_state_adapter::{JsonPeakStore, JsonResultWriter};
use crate::adapters::log_notifier::LogNotifier;
use crate::domain::alert::AlertDigest;
use crate::domain::config_validation;
use crate::domain::correlation::{CorrelationMatrix, HIGH_CORRELATION};
use crate::domain::engine::{CycleResult, Engine, load_peaks};
use crate::domain::error::FundwatchError;
use crate::domain::holding::{EngineSettings, Portfolio};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::NavDataPort;
use crate::ports::notify_port::NotificationPort;
use crate::ports::state_port::CycleResultPort;

const DEFAULT_PEAK_FILE: &str = "peak_record.json";
const DEFAULT_RESULT_FILE: &str = "fund_monitor_result.json";
const DEFAULT_DATA_DIR: &str = "navs";

#[derive(Parser, Debug)]
#[command(name = "fundwatch", about = "Fund portfolio monitor and advisory engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one evaluation cycle over the configured portfolio
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Evaluation date (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Do not write peak state or results
        #[arg(long)]
        no_save: bool,
    },
    /// Validate a portfolio configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the NAV return correlation matrix
    Correlation {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Show data range and stored peak per holding
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import a date,nav CSV into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        holding: String,
        #[arg(long)]
        csv: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            config,
            as_of,
            no_save,
        } => run_evaluate(&config, as_of, no_save),
        Command::Validate { config } => run_validate(&config),
        Command::Correlation { config, as_of } => run_correlation(&config, as_of),
        Command::Info { config } => run_info(&config),
        Command::Import {
            config,
            holding,
            csv,
        } => run_import(&config, &holding, &csv),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Validates and parses the portfolio into an immutable value.
pub fn build_portfolio(config: &dyn ConfigPort) -> Result<Portfolio, FundwatchError> {
    Ok(Portfolio::new(config_validation::parse_portfolio(config)?))
}

pub fn build_engine_settings(config: &dyn ConfigPort) -> Result<EngineSettings, FundwatchError> {
    config_validation::parse_engine_settings(config)
}

/// Relative paths in the config are taken relative to the config file.
pub fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn build_data_port(
    config: &dyn ConfigPort,
    base_dir: &Path,
) -> Result<Box<dyn NavDataPort>, FundwatchError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "dir")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
            let mut adapter = CsvAdapter::new(resolve_path(base_dir, &dir));
            if let Some(quotes) = config.get_string("data", "quotes") {
                adapter = adapter.with_quotes(resolve_path(base_dir, &quotes));
            }
            Ok(Box::new(adapter))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(open_sqlite(config, base_dir)?)),
        other => Err(FundwatchError::config_invalid(
            "data",
            "source",
            format!("unsupported data source: {other}"),
        )),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    config: &dyn ConfigPort,
    base_dir: &Path,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, FundwatchError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let path = config
        .get_string("sqlite", "path")
        .ok_or_else(|| FundwatchError::config_missing("sqlite", "path"))?;
    let pool_size = config_validation::read_int(config, "sqlite", "pool_size")?.unwrap_or(4);
    let pool_size = u32::try_from(pool_size)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| {
            FundwatchError::config_invalid("sqlite", "pool_size", "pool_size must be at least 1")
        })?;
    SqliteAdapter::open(&resolve_path(base_dir, &path), pool_size)
}

/// Peak-state and result file locations.
pub fn state_paths(config: &dyn ConfigPort, base_dir: &Path) -> (PathBuf, PathBuf) {
    let peak = config
        .get_string("state", "peak_file")
        .unwrap_or_else(|| DEFAULT_PEAK_FILE.to_string());
    let result = config
        .get_string("state", "result_file")
        .unwrap_or_else(|| DEFAULT_RESULT_FILE.to_string());
    (resolve_path(base_dir, &peak), resolve_path(base_dir, &result))
}

struct Setup {
    portfolio: Portfolio,
    settings: EngineSettings,
    data_port: Box<dyn NavDataPort>,
    peak_path: PathBuf,
    result_path: PathBuf,
    notify: bool,
}

fn setup(config_path: &Path) -> Result<Setup, ExitCode> {
    let config = load_config(config_path)?;
    let base_dir = config_dir(config_path);

    let built = build_portfolio(&config).and_then(|portfolio| {
        let settings = build_engine_settings(&config)?;
        let data_port = build_data_port(&config, &base_dir)?;
        Ok((portfolio, settings, data_port))
    });
    let (portfolio, settings, data_port) = built.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    let (peak_path, result_path) = state_paths(&config, &base_dir);
    Ok(Setup {
        portfolio,
        settings,
        data_port,
        peak_path,
        result_path,
        notify: config.get_bool("notify", "enabled", true),
    })
}

pub fn run_evaluate(config_path: &Path, as_of: Option<NaiveDate>, no_save: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let setup = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    eprintln!(
        "Evaluating {} holdings as of {}",
        setup.portfolio.len(),
        as_of
    );

    let engine = Engine::new(&setup.portfolio, setup.settings, setup.data_port.as_ref());
    let store = JsonPeakStore::new(setup.peak_path);

    let result = if no_save {
        engine.preview(&store, as_of)
    } else {
        engine.run_cycle(&store, as_of)
    };

    print_summary(&result);

    if !no_save {
        let writer = JsonResultWriter::new(setup.result_path);
        match writer.write(&result) {
            Ok(()) => eprintln!("\nResults written to: {}", writer.path().display()),
            Err(e) => warn!(error = %e, "failed to write cycle result"),
        }
    }

    if let Some(digest) = AlertDigest::from_cycle(&result).filter(|_| setup.notify) {
        if let Err(e) = LogNotifier.notify(&digest) {
            warn!(error = %e, "notification failed");
        }
    }

    if result.all_skipped() {
        let err = FundwatchError::DataUnavailable {
            holding: "all holdings".into(),
        };
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    }

    info!(
        evaluated = result.evaluations().count(),
        skipped = result.skipped().count(),
        alerts = result.alerts().len(),
        "cycle complete"
    );
    ExitCode::SUCCESS
}

pub fn print_summary(result: &CycleResult) {
    eprintln!("\n=== Portfolio ({}) ===", result.as_of);
    if let Some(reason) = &result.peak_state_reset {
        eprintln!("warning: peak state reset ({reason})");
    }
    eprintln!(
        "  {:<10} {:<20} {:>8} {:>8} {:>8} {:>8} {:>7}  {}",
        "code", "name", "nav", "cost", "profit", "dd", "sharpe", "advice"
    );
    for eval in result.evaluations() {
        let flag = if eval.is_degraded() { "*" } else { "" };
        eprintln!(
            "  {:<10} {:<20} {:>8.4} {:>8.4} {:>7.2}% {:>7.2}% {:>7.2}  {} [{}]{}",
            eval.id,
            eval.name,
            eval.nav,
            eval.simulation.average_cost,
            eval.profit_rate * 100.0,
            eval.drawdown * 100.0,
            eval.risk.sharpe,
            eval.advisory.state,
            eval.alert_level(),
            flag,
        );
    }

    let skipped: Vec<_> = result.skipped().collect();
    if !skipped.is_empty() {
        eprintln!("\n=== Skipped ===");
        for s in skipped {
            eprintln!("  {} ({}): data unavailable", s.id, s.name);
        }
    }

    let alerts = result.alerts();
    if !alerts.is_empty() {
        eprintln!("\n=== Alerts ===");
        for eval in alerts {
            eprintln!(
                "  [{}] {}: {} - {}",
                eval.alert_level(),
                eval.name,
                eval.advisory.state,
                eval.advisory.state.suggestion()
            );
        }
    }

    if !result.high_correlation_pairs.is_empty() {
        eprintln!("\n=== High Correlation ===");
        for pair in &result.high_correlation_pairs {
            eprintln!(
                "  {} / {}: {:.2}",
                pair.holding_a, pair.holding_b, pair.correlation
            );
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let parsed = build_portfolio(&config)
        .and_then(|p| build_engine_settings(&config).map(|s| (p, s)));
    let (portfolio, settings) = match parsed {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Config validated successfully");
    eprintln!("\nHoldings:");
    for h in &portfolio.holdings {
        eprintln!(
            "  {} {}: cost {:.4} x {:.2}, {} every {} day(s) from {}, target {:.1}%, callback {:.1}%",
            h.id,
            h.name,
            h.init_cost,
            h.init_shares,
            h.invest_amount,
            h.invest_interval_days,
            h.start_date,
            h.target * 100.0,
            h.callback * 100.0,
        );
    }
    eprintln!(
        "\nEngine: risk_window {}, ma_period {}, risk_free_rate {}",
        settings.risk_window, settings.ma_period, settings.risk_free_rate
    );
    ExitCode::SUCCESS
}

fn run_correlation(config_path: &Path, as_of: Option<NaiveDate>) -> ExitCode {
    let setup = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let engine = Engine::new(&setup.portfolio, setup.settings, setup.data_port.as_ref());
    let matrix = engine.correlation(as_of);

    if matrix.is_empty() {
        eprintln!("Not enough aligned history to compute correlation");
        return ExitCode::SUCCESS;
    }
    print_matrix(&matrix);

    let pairs = matrix.high_correlation_pairs();
    if pairs.is_empty() {
        eprintln!("\nNo pairs above {HIGH_CORRELATION:.2}");
    } else {
        eprintln!("\nPairs above {HIGH_CORRELATION:.2}:");
        for pair in &pairs {
            eprintln!(
                "  {} / {}: {:.2}",
                pair.holding_a, pair.holding_b, pair.correlation
            );
        }
    }
    ExitCode::SUCCESS
}

fn print_matrix(matrix: &CorrelationMatrix) {
    eprintln!("Aligned dates: {}", matrix.aligned_dates);
    let mut header = format!("  {:<10}", "");
    for id in &matrix.ids {
        header.push_str(&format!(" {:>8}", id));
    }
    eprintln!("{header}");
    for a in &matrix.ids {
        let mut line = format!("  {:<10}", a);
        for b in &matrix.ids {
            match matrix.get(a, b) {
                Some(v) => line.push_str(&format!(" {:>8.3}", v)),
                None => line.push_str(&format!(" {:>8}", "-")),
            }
        }
        eprintln!("{line}");
    }
}

fn run_info(config_path: &Path) -> ExitCode {
    let setup = match setup(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (peaks, reset) = load_peaks(&JsonPeakStore::new(setup.peak_path));
    if let Some(reason) = reset {
        eprintln!("warning: stored peak state ignored ({reason})");
    }

    for h in &setup.portfolio.holdings {
        let series = match setup.data_port.fetch_nav_series(&h.id) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("  {} ({}): error: {e}", h.id, h.name);
                continue;
            }
        };
        let peak = peaks.peak(&h.id);
        match (series.first(), series.latest()) {
            (Some(first), Some(last)) => eprintln!(
                "  {} ({}): {} to {} ({} points), peak {:.4}",
                h.id,
                h.name,
                first.date,
                last.date,
                series.len(),
                peak
            ),
            _ => eprintln!("  {} ({}): no data, peak {:.4}", h.id, h.name, peak),
        }
    }
    ExitCode::SUCCESS
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _holding: &str, _csv_path: &Path) -> ExitCode {
    eprintln!("error: sqlite feature is required for import");
    ExitCode::from(1)
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, holding: &str, csv_path: &Path) -> ExitCode {
    use crate::adapters::csv_adapter::parse_nav_csv;

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let base_dir = config_dir(config_path);

    let content = match std::fs::read_to_string(csv_path) {
        Ok(c) => c,
        Err(e) => {
            let err = FundwatchError::Io(e);
            eprintln!("error: failed to read {}: {err}", csv_path.display());
            return (&err).into();
        }
    };

    let imported = parse_nav_csv(&content).and_then(|series| {
        let store = open_sqlite(&config, &base_dir)?;
        let count = store.insert_points(holding, series.points())?;
        Ok((count, store.get_data_range(holding)?))
    });

    match imported {
        Ok((count, range)) => {
            eprintln!("Imported {count} points for {holding}");
            if let Some((first, last, total)) = range {
                eprintln!("  stored: {first} to {last} ({total} points)");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
