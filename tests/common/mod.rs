#![allow(dead_code)]

use scalpcheck::domain::candle::{Candle, CandleSeries, Granularity};
use scalpcheck::domain::error::ScalpcheckError;
use scalpcheck::domain::runner::{BacktestReport, SignalRecord};
use scalpcheck::ports::data_port::{CandleQuery, MarketDataPort, SymbolFilter};
use scalpcheck::ports::report_port::ReportSink;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

pub const MINUTE: i64 = 60_000;
pub const BAR_MINUTES: usize = 15;
pub const COARSE: Granularity = Granularity::FifteenMinutes;

/// Which fetch a mock error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fetch {
    Filters,
    History,
    Scan,
    Forward,
}

pub struct MockMarketData {
    pub series: HashMap<(String, Granularity), Vec<Candle>>,
    pub filters: HashMap<String, SymbolFilter>,
    pub errors: HashMap<Fetch, String>,
    pub queries: RefCell<Vec<(Granularity, CandleQuery)>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            filters: HashMap::new(),
            errors: HashMap::new(),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn with_candles(mut self, symbol: &str, granularity: Granularity, candles: Vec<Candle>) -> Self {
        self.series.insert((symbol.to_string(), granularity), candles);
        self
    }

    pub fn with_price_digit(mut self, symbol: &str, price_digit: u32) -> Self {
        self.filters
            .insert(symbol.to_string(), SymbolFilter { price_digit });
        self
    }

    pub fn with_error(mut self, fetch: Fetch, reason: &str) -> Self {
        self.errors.insert(fetch, reason.to_string());
        self
    }

    fn check(&self, fetch: Fetch) -> Result<(), ScalpcheckError> {
        match self.errors.get(&fetch) {
            Some(reason) => Err(ScalpcheckError::Retrieval {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_candle_series(
        &self,
        symbol: &str,
        granularity: Granularity,
        query: &CandleQuery,
    ) -> Result<CandleSeries, ScalpcheckError> {
        self.queries.borrow_mut().push((granularity, *query));

        let fetch = if granularity != Granularity::FINER {
            Fetch::History
        } else if query.end_time.is_some() {
            Fetch::Scan
        } else {
            Fetch::Forward
        };
        self.check(fetch)?;

        let mut selected: Vec<Candle> = self
            .series
            .get(&(symbol.to_string(), granularity))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| query.start_time.is_none_or(|s| c.close_time >= s))
            .filter(|c| query.end_time.is_none_or(|e| c.open_time < e))
            .collect();

        if let Some(limit) = query.limit {
            if query.start_time.is_some() {
                selected.truncate(limit);
            } else if selected.len() > limit {
                selected.drain(..selected.len() - limit);
            }
        }

        CandleSeries::new(symbol, granularity, selected)
    }

    fn fetch_symbol_filters(&self) -> Result<HashMap<String, SymbolFilter>, ScalpcheckError> {
        self.check(Fetch::Filters)?;
        Ok(self.filters.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub signals: RefCell<Vec<SignalRecord>>,
    pub summaries: RefCell<Vec<BacktestReport>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coarse_indices(&self) -> Vec<usize> {
        self.signals.borrow().iter().map(|r| r.coarse_index).collect()
    }
}

impl ReportSink for RecordingSink {
    fn log_signal(&self, record: &SignalRecord) {
        self.signals.borrow_mut().push(record.clone());
    }

    fn log_summary(&self, report: &BacktestReport) {
        self.summaries.borrow_mut().push(report.clone());
    }
}

/// Fires on any green one-minute candle.
pub fn green_minute(opens: &[f64], closes: &[f64], _price_digit: u32) -> bool {
    match (opens.last(), closes.last()) {
        (Some(open), Some(close)) => close > open,
        _ => false,
    }
}

pub fn minute(index: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    let open_time = index as i64 * MINUTE;
    Candle {
        open_price: open,
        close_price: close,
        high_price: high,
        low_price: low,
        open_time,
        close_time: open_time + MINUTE - 1,
    }
}

/// One-minute candles that never move off `price`.
pub fn flat_minutes(count: usize, price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| minute(i, price, price, price, price))
        .collect()
}

/// Fifteen-minute bars, green unless listed in `red`.
pub fn coarse_bars(count: usize, red: &[usize]) -> Vec<Candle> {
    let bar_ms = COARSE.duration_ms();
    (0..count)
        .map(|i| {
            let (open, close) = if red.contains(&i) {
                (101.0, 100.0)
            } else {
                (100.0, 101.0)
            };
            let open_time = i as i64 * bar_ms;
            Candle {
                open_price: open,
                close_price: close,
                high_price: 102.0,
                low_price: 99.0,
                open_time,
                close_time: open_time + bar_ms - 1,
            }
        })
        .collect()
}

/// Index of a minute candle inside coarse bar `bar`.
pub fn minute_in_bar(bar: usize, offset: usize) -> usize {
    bar * BAR_MINUTES + offset
}

/// Twelve coarse bars; bar 6 is red. One-minute entries fire in bar 5 (then
/// a take-profit bar) and bar 9 (then a stop-loss bar).
pub fn two_signal_market(symbol: &str) -> MockMarketData {
    MockMarketData::new()
        .with_price_digit(symbol, 2)
        .with_candles(symbol, COARSE, coarse_bars(12, &[6]))
        .with_candles(symbol, Granularity::FINER, two_signal_minutes())
}

pub fn two_signal_minutes() -> Vec<Candle> {
    let mut minutes = flat_minutes(12 * BAR_MINUTES, 100.0);

    let entry = minute_in_bar(5, 3);
    minutes[entry] = minute(entry, 100.0, 101.0, 100.0, 101.0);
    minutes[entry + 1] = minute(entry + 1, 100.0, 104.0, 100.0, 100.0);

    let entry = minute_in_bar(9, 7);
    minutes[entry] = minute(entry, 100.0, 101.0, 100.0, 101.0);
    minutes[entry + 1] = minute(entry + 1, 100.0, 100.0, 99.0, 100.0);

    minutes
}

pub fn write_candles_csv(path: &Path, candles: &[Candle]) {
    let mut content = String::from("open_time,open,high,low,close,close_time\n");
    for c in candles {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.open_time, c.open_price, c.high_price, c.low_price, c.close_price, c.close_time
        ));
    }
    std::fs::write(path, content).unwrap();
}
