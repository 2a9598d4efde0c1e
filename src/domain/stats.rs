//! Running statistics for a backtest and the summary derived from them.

use crate::domain::candle::Candle;
use crate::domain::outcome::{precise, OutcomeKind, TradeOutcome};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestStats {
    pub signal_count: usize,
    /// Signals whose triggering coarse bar closed green.
    pub first_candle_increase: usize,
    /// Signals whose following coarse bar closed green.
    pub next_candle_increase: usize,
    pub first_and_next_candle_increase: usize,
    /// Sum of profit fractions over all signals.
    pub total_profit: f64,
    pub profit_hits: usize,
    pub loss_hits: usize,
    pub ties: usize,
    pub unresolved: usize,
}

impl BacktestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Books one signal: its outcome and the colour of the triggering and
    /// following coarse bars.
    pub fn record(&mut self, outcome: &TradeOutcome, current: &Candle, next: &Candle) {
        self.signal_count += 1;
        self.total_profit += outcome.profit;

        match outcome.kind {
            OutcomeKind::ProfitHit => self.profit_hits += 1,
            OutcomeKind::LossHit => self.loss_hits += 1,
            OutcomeKind::Tie => self.ties += 1,
            OutcomeKind::Unresolved => self.unresolved += 1,
        }

        let current_green = current.is_green();
        let next_green = next.is_green();
        if current_green {
            self.first_candle_increase += 1;
        }
        if next_green {
            self.next_candle_increase += 1;
        }
        if current_green && next_green {
            self.first_and_next_candle_increase += 1;
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            current_green_pct: self.percent_of_signals(self.first_candle_increase),
            next_green_pct: self.percent_of_signals(self.next_candle_increase),
            both_green_pct: self.percent_of_signals(self.first_and_next_candle_increase),
            total_profit_pct: precise(100.0 * self.total_profit),
            average_profit_pct: (self.signal_count > 0)
                .then(|| precise(100.0 * self.total_profit / self.signal_count as f64)),
            signal_count: self.signal_count,
        }
    }

    fn percent_of_signals(&self, count: usize) -> Option<f64> {
        if self.signal_count == 0 {
            None
        } else {
            Some(100.0 * count as f64 / self.signal_count as f64)
        }
    }
}

/// End-of-run figures. Ratios over the signal count are `None` when no
/// signal was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub current_green_pct: Option<f64>,
    pub next_green_pct: Option<f64>,
    pub both_green_pct: Option<f64>,
    pub total_profit_pct: f64,
    pub average_profit_pct: Option<f64>,
    pub signal_count: usize,
}

/// Formats an optional percentage, `n/a` when undefined.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "n/a".to_string(),
    }
}
