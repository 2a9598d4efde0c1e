//! Market data access port trait.

use crate::domain::candle::{CandleSeries, Granularity};
use crate::domain::error::ScalpcheckError;
use std::collections::HashMap;

/// Time bounds and size cap for a candle fetch.
///
/// A candle is selected when it overlaps `[start_time, end_time)`: it closes
/// at or after `start_time` and opens before `end_time`. Starting a query at a
/// candle's close time therefore returns that candle first. With a `limit`,
/// the first `limit` candles are kept when `start_time` is set, otherwise the
/// most recent `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandleQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<usize>,
}

impl CandleQuery {
    pub fn range(start_time: i64, end_time: i64) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            limit: None,
        }
    }

    pub fn starting_at(start_time: i64, limit: usize) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: None,
            limit: Some(limit),
        }
    }

    pub fn latest(limit: usize) -> Self {
        Self {
            start_time: None,
            end_time: None,
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFilter {
    pub price_digit: u32,
}

pub trait MarketDataPort {
    fn fetch_candle_series(
        &self,
        symbol: &str,
        granularity: Granularity,
        query: &CandleQuery,
    ) -> Result<CandleSeries, ScalpcheckError>;

    fn fetch_symbol_filters(&self) -> Result<HashMap<String, SymbolFilter>, ScalpcheckError>;
}
