//! Backtest orchestration.
//!
//! Walks the coarse candle history in ascending order. For every bar past the
//! warm-up offset the price history before it becomes the indicator window and
//! the bar's one-minute candles are scanned for an entry. Each entry is
//! resolved forward against the take-profit and stop-loss levels and booked
//! into [`BacktestStats`].
//!
//! Any error escaping the scanner or the simulator ends the run; statistics
//! gathered so far are dropped with it.

use crate::domain::candle::Granularity;
use crate::domain::error::ScalpcheckError;
use crate::domain::outcome::{TradeOutcome, TradeOutcomeSimulator, DEFAULT_LOOKAHEAD_LIMIT};
use crate::domain::scanner::SignalScanner;
use crate::domain::stats::{BacktestStats, Summary};
use crate::ports::data_port::{CandleQuery, MarketDataPort};
use crate::ports::report_port::ReportSink;
use crate::ports::signal_port::EntrySignal;
use chrono::DateTime;
use tracing::{debug, error, info_span, warn};

pub const DEFAULT_HISTORY_LIMIT: usize = 700;
pub const DEFAULT_WARMUP: usize = 200;
pub const DEFAULT_PROFIT_MULTIPLIER: f64 = 1.02;
pub const DEFAULT_STOP_LOSS_MULTIPLIER: f64 = 0.99;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub symbol: String,
    pub interval: Granularity,
    pub profit_multiplier: f64,
    pub stop_loss_multiplier: f64,
    /// Coarse bars fetched for the run.
    pub history_limit: usize,
    /// First coarse index evaluated; earlier bars only feed the window.
    pub warmup: usize,
    /// One-minute bars fetched after each entry.
    pub lookahead_limit: usize,
}

impl BacktestConfig {
    pub fn new(
        symbol: impl Into<String>,
        interval: Granularity,
        profit_multiplier: f64,
        stop_loss_multiplier: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            profit_multiplier,
            stop_loss_multiplier,
            history_limit: DEFAULT_HISTORY_LIMIT,
            warmup: DEFAULT_WARMUP,
            lookahead_limit: DEFAULT_LOOKAHEAD_LIMIT,
        }
    }
}

/// One discovered entry and how it played out.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub symbol: String,
    pub coarse_index: usize,
    pub buying_price: f64,
    pub buying_time: i64,
    pub outcome: TradeOutcome,
}

impl SignalRecord {
    pub fn profit_pct(&self) -> f64 {
        100.0 * self.outcome.profit
    }

    pub fn entry_time(&self) -> String {
        format_epoch_ms(self.buying_time)
    }
}

/// Human-readable UTC timestamp for epoch milliseconds.
pub fn format_epoch_ms(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ms.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub symbol: String,
    pub interval: Granularity,
    pub stats: BacktestStats,
    pub summary: Summary,
}

pub struct BacktestRunner<'a> {
    data: &'a dyn MarketDataPort,
    indicator: &'a dyn EntrySignal,
    report: &'a dyn ReportSink,
}

impl<'a> BacktestRunner<'a> {
    pub fn new(
        data: &'a dyn MarketDataPort,
        indicator: &'a dyn EntrySignal,
        report: &'a dyn ReportSink,
    ) -> Self {
        Self {
            data,
            indicator,
            report,
        }
    }

    pub fn run(&self, config: &BacktestConfig) -> Result<BacktestReport, ScalpcheckError> {
        let symbol = config.symbol.as_str();
        let _span = info_span!("backtest", symbol, interval = %config.interval).entered();

        let filters = self
            .data
            .fetch_symbol_filters()
            .map_err(|e| failed("filters", symbol, e))?;
        let price_digit = filters
            .get(symbol)
            .map(|f| f.price_digit)
            .ok_or_else(|| {
                failed(
                    "filters",
                    symbol,
                    ScalpcheckError::UnknownSymbol {
                        symbol: symbol.to_string(),
                    },
                )
            })?;

        let history = self
            .data
            .fetch_candle_series(
                symbol,
                config.interval,
                &CandleQuery::latest(config.history_limit),
            )
            .map_err(|e| failed("history", symbol, e))?;

        if history.len() < config.warmup.saturating_add(2) {
            warn!(
                symbol,
                bars = history.len(),
                warmup = config.warmup,
                "not enough history past the warm-up offset, no bars evaluated"
            );
        }

        let scanner = SignalScanner::new(self.data, self.indicator);
        let simulator =
            TradeOutcomeSimulator::new(self.data).with_lookahead_limit(config.lookahead_limit);

        let candles = history.candles();
        let opens = history.open_prices();
        let closes = history.close_prices();
        let mut stats = BacktestStats::new();

        for i in config.warmup..candles.len().saturating_sub(1) {
            let current = &candles[i];
            let next = &candles[i + 1];

            let signal = scanner
                .scan(
                    symbol,
                    &opens[..i],
                    &closes[..i],
                    current.open_time,
                    current.close_time,
                    price_digit,
                )
                .map_err(|e| failed("signal_scan", symbol, e))?;

            let Some(signal) = signal else {
                continue;
            };

            let outcome = simulator
                .simulate(
                    symbol,
                    signal.buying_price,
                    signal.buying_time,
                    config.profit_multiplier,
                    config.stop_loss_multiplier,
                )
                .map_err(|e| failed("trade_outcome", symbol, e))?;

            debug!(coarse_index = i, kind = ?outcome.kind, "signal resolved");
            stats.record(&outcome, current, next);

            self.report.log_signal(&SignalRecord {
                symbol: symbol.to_string(),
                coarse_index: i,
                buying_price: signal.buying_price,
                buying_time: signal.buying_time,
                outcome,
            });
        }

        let report = BacktestReport {
            symbol: symbol.to_string(),
            interval: config.interval,
            summary: stats.summary(),
            stats,
        };
        self.report.log_summary(&report);
        Ok(report)
    }
}

fn failed(phase: &'static str, symbol: &str, err: ScalpcheckError) -> ScalpcheckError {
    error!(phase, symbol, error = %err, "backtest aborted");
    err
}
