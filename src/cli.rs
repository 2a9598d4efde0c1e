//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvMarketData;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_report::TracingReportSink;
use crate::domain::config_validation::{
    check_history, check_profit_multiplier, check_stop_loss_multiplier, parse_coarse_interval,
    read_count, validate_backtest_config, validate_indicator_config,
};
use crate::domain::error::ScalpcheckError;
use crate::domain::indicator::ema_cross::{
    EmaCrossSignal, DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD,
};
use crate::domain::outcome::DEFAULT_LOOKAHEAD_LIMIT;
use crate::domain::runner::{
    BacktestConfig, BacktestRunner, DEFAULT_HISTORY_LIMIT,
    DEFAULT_PROFIT_MULTIPLIER, DEFAULT_STOP_LOSS_MULTIPLIER, DEFAULT_WARMUP,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportSink;
use crate::ports::signal_port::EntrySignal;

#[derive(Parser, Debug)]
#[command(name = "scalpcheck", about = "Candlestick entry-signal backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for each configured symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        profit_multiplier: Option<f64>,
        #[arg(long)]
        stop_loss_multiplier: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub profit_multiplier: Option<f64>,
    pub stop_loss_multiplier: Option<f64>,
}

pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scalpcheck={}", default_level)));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Backtest {
            config,
            symbol,
            interval,
            profit_multiplier,
            stop_loss_multiplier,
        } => run_backtest(
            &config,
            &Overrides {
                symbol,
                interval,
                profit_multiplier,
                stop_loss_multiplier,
            },
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        error!("{e}");
        ExitCode::from(&e)
    })
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter)
        .and_then(|()| validate_indicator_config(&adapter))
    {
        error!("{e}");
        return (&e).into();
    }

    let configs = match build_backtest_configs(&adapter, overrides) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    let indicator = build_indicator(&adapter);
    let data_path = adapter.get_string("data", "path").unwrap_or_default();
    let data = CsvMarketData::new(PathBuf::from(data_path.trim()));

    run_backtests(&data, &indicator, &TracingReportSink, &configs)
}

/// Runs each config in turn. A failed symbol is logged and the next one
/// proceeds; the exit code reflects the first failure.
pub fn run_backtests(
    data: &dyn MarketDataPort,
    indicator: &dyn EntrySignal,
    report: &dyn ReportSink,
    configs: &[BacktestConfig],
) -> ExitCode {
    let runner = BacktestRunner::new(data, indicator, report);
    let mut first_failure: Option<ExitCode> = None;
    let mut completed = 0usize;

    for config in configs {
        info!(
            symbol = %config.symbol,
            interval = %config.interval,
            profit_multiplier = config.profit_multiplier,
            stop_loss_multiplier = config.stop_loss_multiplier,
            "running backtest"
        );
        match runner.run(config) {
            Ok(_) => completed += 1,
            Err(e) => {
                warn!(symbol = %config.symbol, "skipping symbol: {e}");
                first_failure.get_or_insert_with(|| (&e).into());
            }
        }
    }

    info!(
        completed,
        failed = configs.len() - completed,
        "all backtests finished"
    );
    first_failure.unwrap_or(ExitCode::SUCCESS)
}

pub fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(s) = symbol_override {
        return vec![s.trim().to_uppercase()];
    }

    let mut symbols: Vec<String> = Vec::new();
    for s in config.get_list("backtest", "symbols") {
        let s = s.to_uppercase();
        if !symbols.contains(&s) {
            symbols.push(s);
        }
    }
    symbols
}

pub fn build_backtest_configs(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<Vec<BacktestConfig>, ScalpcheckError> {
    let interval_str = match &overrides.interval {
        Some(i) => i.clone(),
        None => adapter.get_string("backtest", "interval").ok_or_else(|| {
            ScalpcheckError::ConfigMissing {
                section: "backtest".into(),
                key: "interval".into(),
            }
        })?,
    };
    let interval = parse_coarse_interval(&interval_str)?;

    let profit_multiplier = check_profit_multiplier(overrides.profit_multiplier.unwrap_or_else(
        || adapter.get_double("backtest", "profit_multiplier", DEFAULT_PROFIT_MULTIPLIER),
    ))?;
    let stop_loss_multiplier =
        check_stop_loss_multiplier(overrides.stop_loss_multiplier.unwrap_or_else(|| {
            adapter.get_double(
                "backtest",
                "stop_loss_multiplier",
                DEFAULT_STOP_LOSS_MULTIPLIER,
            )
        }))?;

    let symbols = resolve_symbols(overrides.symbol.as_deref(), adapter);
    if symbols.is_empty() {
        return Err(ScalpcheckError::ConfigMissing {
            section: "backtest".into(),
            key: "symbols".into(),
        });
    }

    let warmup = read_count(adapter, "warmup", DEFAULT_WARMUP, 1)?;
    let history_limit = read_count(adapter, "history_limit", DEFAULT_HISTORY_LIMIT, 0)?;
    check_history(warmup, history_limit)?;
    let lookahead_limit = read_count(adapter, "lookahead_limit", DEFAULT_LOOKAHEAD_LIMIT, 2)?;

    Ok(symbols
        .into_iter()
        .map(|symbol| BacktestConfig {
            history_limit,
            warmup,
            lookahead_limit,
            ..BacktestConfig::new(symbol, interval, profit_multiplier, stop_loss_multiplier)
        })
        .collect())
}

pub fn build_indicator(adapter: &dyn ConfigPort) -> EmaCrossSignal {
    EmaCrossSignal::new(
        adapter.get_int("indicator", "fast_period", DEFAULT_FAST_PERIOD as i64) as usize,
        adapter.get_int("indicator", "slow_period", DEFAULT_SLOW_PERIOD as i64) as usize,
    )
}

fn run_validate(config_path: &Path) -> ExitCode {
    info!(path = %config_path.display(), "validating config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter)
        .and_then(|()| validate_indicator_config(&adapter))
    {
        error!("{e}");
        return (&e).into();
    }

    let configs = match build_backtest_configs(&adapter, &Overrides::default()) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let indicator = build_indicator(&adapter);

    for config in &configs {
        info!(
            symbol = %config.symbol,
            interval = %config.interval,
            profit_multiplier = config.profit_multiplier,
            stop_loss_multiplier = config.stop_loss_multiplier,
            history_limit = config.history_limit,
            warmup = config.warmup,
            lookahead_limit = config.lookahead_limit,
            "backtest"
        );
    }
    info!(
        fast_period = indicator.fast_period,
        slow_period = indicator.slow_period,
        "ema cross indicator"
    );
    info!("configuration is valid");
    ExitCode::SUCCESS
}
