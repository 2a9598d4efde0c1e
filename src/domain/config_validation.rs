//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::candle::Granularity;
use crate::domain::error::ScalpcheckError;
use crate::domain::indicator::ema_cross::{DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::domain::outcome::DEFAULT_LOOKAHEAD_LIMIT;
use crate::domain::runner::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_PROFIT_MULTIPLIER, DEFAULT_STOP_LOSS_MULTIPLIER,
    DEFAULT_WARMUP,
};
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    validate_data_path(config)?;
    validate_symbols(config)?;
    validate_interval(config)?;
    validate_multipliers(config)?;
    validate_history(config)?;
    validate_lookahead(config)?;
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    for (key, default) in [
        ("fast_period", DEFAULT_FAST_PERIOD),
        ("slow_period", DEFAULT_SLOW_PERIOD),
    ] {
        if config.get_int("indicator", key, default as i64) < 1 {
            return Err(invalid("indicator", key, format!("{} must be at least 1", key)));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> ScalpcheckError {
    ScalpcheckError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ScalpcheckError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    if config.get_list("backtest", "symbols").is_empty() {
        return Err(ScalpcheckError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(())
}

/// Parses a coarse interval; the 1m scanning granularity is rejected.
pub fn parse_coarse_interval(raw: &str) -> Result<Granularity, ScalpcheckError> {
    match raw.parse::<Granularity>() {
        Ok(Granularity::OneMinute) => Err(invalid(
            "backtest",
            "interval",
            "interval must be coarser than the 1m scanning granularity".to_string(),
        )),
        Ok(g) => Ok(g),
        Err(e) => Err(invalid("backtest", "interval", e.to_string())),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    match config.get_string("backtest", "interval") {
        None => Err(ScalpcheckError::ConfigMissing {
            section: "backtest".to_string(),
            key: "interval".to_string(),
        }),
        Some(s) => parse_coarse_interval(&s).map(|_| ()),
    }
}

/// `profit_multiplier` must be a finite value above 1.
pub fn check_profit_multiplier(value: f64) -> Result<f64, ScalpcheckError> {
    if !value.is_finite() || value <= 1.0 {
        return Err(invalid(
            "backtest",
            "profit_multiplier",
            format!("profit_multiplier must be a finite number greater than 1, got {value}"),
        ));
    }
    Ok(value)
}

/// `stop_loss_multiplier` must lie strictly between 0 and 1.
pub fn check_stop_loss_multiplier(value: f64) -> Result<f64, ScalpcheckError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "backtest",
            "stop_loss_multiplier",
            format!("stop_loss_multiplier must be between 0 and 1, got {value}"),
        ));
    }
    Ok(value)
}

/// Reads a non-negative `[backtest]` count of at least `min`.
pub fn read_count(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize, ScalpcheckError> {
    let raw = config.get_int("backtest", key, default as i64);
    match usize::try_from(raw) {
        Ok(value) if value >= min => Ok(value),
        _ => Err(invalid(
            "backtest",
            key,
            format!("{key} must be at least {min}, got {raw}"),
        )),
    }
}

/// The history must reach two bars past the warm-up offset.
pub fn check_history(warmup: usize, history_limit: usize) -> Result<(), ScalpcheckError> {
    match warmup.checked_add(2) {
        Some(required) if history_limit >= required => Ok(()),
        Some(required) => Err(invalid(
            "backtest",
            "history_limit",
            format!("history_limit must be at least warmup + 2 ({required})"),
        )),
        None => Err(invalid(
            "backtest",
            "warmup",
            format!("warmup {warmup} is too large"),
        )),
    }
}

fn validate_multipliers(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    check_profit_multiplier(config.get_double(
        "backtest",
        "profit_multiplier",
        DEFAULT_PROFIT_MULTIPLIER,
    ))?;
    check_stop_loss_multiplier(config.get_double(
        "backtest",
        "stop_loss_multiplier",
        DEFAULT_STOP_LOSS_MULTIPLIER,
    ))?;
    Ok(())
}

fn validate_history(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    let warmup = read_count(config, "warmup", DEFAULT_WARMUP, 1)?;
    let history_limit = read_count(config, "history_limit", DEFAULT_HISTORY_LIMIT, 0)?;
    check_history(warmup, history_limit)
}

fn validate_lookahead(config: &dyn ConfigPort) -> Result<(), ScalpcheckError> {
    // Entry bar plus at least one bar to resolve against
    read_count(config, "lookahead_limit", DEFAULT_LOOKAHEAD_LIMIT, 2).map(|_| ())
}
