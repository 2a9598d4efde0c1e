//! EMA crossover entry signal.
//!
//! Compares a fast EMA of close prices with a slow EMA of open prices, both
//! rounded to the symbol's price precision. The signal fires on the slide
//! where the slow-minus-fast difference turns from positive to negative,
//! i.e. the fast line crosses above the slow one.

use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::round_to_digit;
use crate::domain::price_window::{elementwise_difference, last_of};
use crate::ports::signal_port::EntrySignal;

pub const DEFAULT_FAST_PERIOD: usize = 13;
pub const DEFAULT_SLOW_PERIOD: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmaCrossSignal {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for EmaCrossSignal {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
        }
    }
}

impl EmaCrossSignal {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
        }
    }

    /// Slow-minus-fast EMA difference at the last two window positions.
    fn recent_differences(
        &self,
        open_prices: &[f64],
        close_prices: &[f64],
        price_digit: u32,
    ) -> Option<Vec<f64>> {
        let fast = rounded_tail(&calculate_ema(close_prices, self.fast_period), price_digit)?;
        let slow = rounded_tail(&calculate_ema(open_prices, self.slow_period), price_digit)?;
        Some(elementwise_difference(&slow, &fast))
    }
}

fn rounded_tail(series: &[f64], price_digit: u32) -> Option<Vec<f64>> {
    let tail = series.get(series.len().checked_sub(2)?..)?;
    Some(tail.iter().map(|&v| round_to_digit(v, price_digit)).collect())
}

impl EntrySignal for EmaCrossSignal {
    fn evaluate(&self, open_prices: &[f64], close_prices: &[f64], price_digit: u32) -> bool {
        let Some(diff) = self.recent_differences(open_prices, close_prices, price_digit) else {
            return false;
        };
        match (diff.first(), last_of(&diff)) {
            (Some(&prev), Some(&curr)) => prev > 0.0 && curr < 0.0,
            _ => false,
        }
    }
}
