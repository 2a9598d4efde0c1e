//! CSV file market data adapter.
//!
//! Candles live in `{SYMBOL}_{interval}.csv` with the header
//! `open_time,open,high,low,close,close_time` (times in epoch milliseconds).
//! Exchange filters live in `filters.csv` with the header `symbol,tick_size`;
//! the price digit is the number of decimals in the tick size.
//!
//! A backtest fetches the one-minute file once per coarse bar and once per
//! signal, so parsed candle files are cached per path for the adapter's
//! lifetime. Files are assumed not to change during a run.

use crate::domain::candle::{Candle, CandleSeries, Granularity};
use crate::domain::error::ScalpcheckError;
use crate::ports::data_port::{CandleQuery, MarketDataPort, SymbolFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const FILTERS_FILE: &str = "filters.csv";

pub struct CsvMarketData {
    base_path: PathBuf,
    // Sorted by open time
    candles: RefCell<HashMap<PathBuf, Vec<Candle>>>,
}

impl CsvMarketData {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            candles: RefCell::new(HashMap::new()),
        }
    }

    fn candle_path(&self, symbol: &str, granularity: Granularity) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, granularity.as_str()))
    }

    fn parse_candles(&self, path: &Path) -> Result<Vec<Candle>, ScalpcheckError> {
        let content = self.read(path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ScalpcheckError::Retrieval {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            candles.push(Candle {
                open_time: field(&record, 0, "open_time")?,
                open_price: field(&record, 1, "open")?,
                high_price: field(&record, 2, "high")?,
                low_price: field(&record, 3, "low")?,
                close_price: field(&record, 4, "close")?,
                close_time: field(&record, 5, "close_time")?,
            });
        }

        candles.sort_by_key(|c| c.open_time);
        Ok(candles)
    }

    fn read(&self, path: &Path) -> Result<String, ScalpcheckError> {
        fs::read_to_string(path).map_err(|e| ScalpcheckError::Retrieval {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, ScalpcheckError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| ScalpcheckError::Retrieval {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| ScalpcheckError::Retrieval {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Decimal places in a tick size such as `0.01000000` (-> 2) or `1e-8` (-> 8).
pub fn price_digit_from_tick_size(tick_size: &str) -> Option<u32> {
    let tick_size = tick_size.trim();
    let value: f64 = tick_size.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let (mantissa, exponent) = match tick_size.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i64>().ok()?),
        None => (tick_size, 0),
    };
    let fraction_digits = match mantissa.split_once('.') {
        Some((_, fraction)) => fraction.trim_end_matches('0').len() as i64,
        None => 0,
    };
    u32::try_from((fraction_digits - exponent).max(0)).ok()
}

/// Applies time bounds and the limit to candles already sorted by open time.
fn apply_query(candles: &[Candle], query: &CandleQuery) -> Vec<Candle> {
    let mut selected: Vec<Candle> = candles
        .iter()
        .filter(|c| query.start_time.is_none_or(|start| c.close_time >= start))
        .filter(|c| query.end_time.is_none_or(|end| c.open_time < end))
        .cloned()
        .collect();

    if let Some(limit) = query.limit {
        if query.start_time.is_some() {
            selected.truncate(limit);
        } else if selected.len() > limit {
            selected.drain(..selected.len() - limit);
        }
    }
    selected
}

impl MarketDataPort for CsvMarketData {
    fn fetch_candle_series(
        &self,
        symbol: &str,
        granularity: Granularity,
        query: &CandleQuery,
    ) -> Result<CandleSeries, ScalpcheckError> {
        let path = self.candle_path(symbol, granularity);
        if let Some(candles) = self.candles.borrow().get(&path) {
            return CandleSeries::new(symbol, granularity, apply_query(candles, query));
        }

        let candles = self.parse_candles(&path)?;
        let series = CandleSeries::new(symbol, granularity, apply_query(&candles, query));
        self.candles.borrow_mut().insert(path, candles);
        series
    }

    fn fetch_symbol_filters(&self) -> Result<HashMap<String, SymbolFilter>, ScalpcheckError> {
        let path = self.base_path.join(FILTERS_FILE);
        let content = self.read(&path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut filters = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ScalpcheckError::Retrieval {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let symbol: String = field(&record, 0, "symbol")?;
            let tick_size = record.get(1).ok_or_else(|| ScalpcheckError::Retrieval {
                reason: "missing tick_size column".into(),
            })?;
            let price_digit =
                price_digit_from_tick_size(tick_size).ok_or_else(|| ScalpcheckError::Retrieval {
                    reason: format!("invalid tick_size for {}: {}", symbol, tick_size),
                })?;

            filters.insert(symbol.to_uppercase(), SymbolFilter { price_digit });
        }

        Ok(filters)
    }
}
