//! Intra-bar entry signal scanning.
//!
//! Walks the one-minute candles inside a coarse bar, sliding the price window
//! one candle at a time and asking the indicator for a verdict after each
//! slide. The first candle that triggers wins; entry is taken at that candle's
//! close.

use crate::domain::candle::Granularity;
use crate::domain::error::ScalpcheckError;
use crate::domain::price_window::PriceWindow;
use crate::ports::data_port::{CandleQuery, MarketDataPort};
use crate::ports::signal_port::EntrySignal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub buying_price: f64,
    pub buying_time: i64,
}

pub struct SignalScanner<'a> {
    data: &'a dyn MarketDataPort,
    indicator: &'a dyn EntrySignal,
}

impl<'a> SignalScanner<'a> {
    pub fn new(data: &'a dyn MarketDataPort, indicator: &'a dyn EntrySignal) -> Self {
        Self { data, indicator }
    }

    /// Scans `[start_time, end_time)` for the first triggering finer candle.
    ///
    /// The window capacity is the length of the supplied open/close slices.
    /// Returns `Ok(None)` when no candle in the range triggers.
    pub fn scan(
        &self,
        symbol: &str,
        price_window_open: &[f64],
        price_window_close: &[f64],
        start_time: i64,
        end_time: i64,
        price_digit: u32,
    ) -> Result<Option<Signal>, ScalpcheckError> {
        let mut window = PriceWindow::from_history(price_window_open, price_window_close)?;
        if start_time >= end_time {
            return Err(ScalpcheckError::InvalidTimeRange {
                start_time,
                end_time,
            });
        }

        let candles = self.data.fetch_candle_series(
            symbol,
            Granularity::FINER,
            &CandleQuery::range(start_time, end_time),
        )?;

        for candle in candles.candles() {
            window.slide(candle.open_price, candle.close_price);

            if self
                .indicator
                .evaluate(window.opens(), window.closes(), price_digit)
            {
                return Ok(Some(Signal {
                    buying_price: candle.close_price,
                    buying_time: candle.close_time,
                }));
            }
        }

        Ok(None)
    }
}
