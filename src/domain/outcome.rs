//! Forward trade outcome resolution.
//!
//! From the entry bar, walks forward one-minute candles until the take-profit
//! or stop-loss level is touched. A bar touching both levels is a tie and is
//! booked at the midpoint of the two exits.

use crate::domain::candle::{CandleSeries, Granularity};
use crate::domain::error::ScalpcheckError;
use crate::ports::data_port::{CandleQuery, MarketDataPort};

/// Finer bars fetched after an entry when no other lookahead is configured.
pub const DEFAULT_LOOKAHEAD_LIMIT: usize = 500;

/// Rounds half away from zero to 4 decimal places.
pub fn precise(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    ProfitHit,
    LossHit,
    Tie,
    /// Neither level was touched within the fetched bars.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeOutcome {
    pub kind: OutcomeKind,
    /// Profit fraction, e.g. 0.02 for +2%.
    pub profit: f64,
    /// Index into the forward series of the bar that resolved the trade.
    pub exit_index: Option<usize>,
    pub exit_time: Option<i64>,
}

impl TradeOutcome {
    pub fn unresolved() -> Self {
        Self {
            kind: OutcomeKind::Unresolved,
            profit: 0.0,
            exit_index: None,
            exit_time: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.kind != OutcomeKind::Unresolved
    }
}

/// Classifies a trade against an already-fetched forward series.
///
/// Index 0 is the entry bar and is skipped. The first bar touching either
/// level decides the outcome; later bars are not inspected.
pub fn resolve_outcome(
    forward: &CandleSeries,
    buying_price: f64,
    profit_multiplier: f64,
    stop_loss_multiplier: f64,
) -> TradeOutcome {
    let take_profit = buying_price * profit_multiplier;
    let stop_loss = buying_price * stop_loss_multiplier;

    for (i, candle) in forward.candles().iter().enumerate().skip(1) {
        let is_profit = candle.high_price >= take_profit;
        let is_loss = candle.low_price <= stop_loss;

        let (kind, raw) = match (is_profit, is_loss) {
            (true, true) => (
                OutcomeKind::Tie,
                (profit_multiplier + stop_loss_multiplier) * 0.5 - 1.0,
            ),
            (true, false) => (OutcomeKind::ProfitHit, profit_multiplier - 1.0),
            (false, true) => (OutcomeKind::LossHit, stop_loss_multiplier - 1.0),
            (false, false) => continue,
        };

        return TradeOutcome {
            kind,
            profit: precise(raw),
            exit_index: Some(i),
            exit_time: Some(candle.open_time),
        };
    }

    TradeOutcome::unresolved()
}

pub struct TradeOutcomeSimulator<'a> {
    data: &'a dyn MarketDataPort,
    lookahead_limit: usize,
}

impl<'a> TradeOutcomeSimulator<'a> {
    pub fn new(data: &'a dyn MarketDataPort) -> Self {
        Self {
            data,
            lookahead_limit: DEFAULT_LOOKAHEAD_LIMIT,
        }
    }

    pub fn with_lookahead_limit(mut self, limit: usize) -> Self {
        self.lookahead_limit = limit;
        self
    }

    /// Fetches finer candles from `buying_time` and resolves the trade.
    ///
    /// Multipliers are taken as given; `profit_multiplier > 1` and
    /// `0 < stop_loss_multiplier < 1` are the caller's responsibility.
    pub fn simulate(
        &self,
        symbol: &str,
        buying_price: f64,
        buying_time: i64,
        profit_multiplier: f64,
        stop_loss_multiplier: f64,
    ) -> Result<TradeOutcome, ScalpcheckError> {
        let forward = self.data.fetch_candle_series(
            symbol,
            Granularity::FINER,
            &CandleQuery::starting_at(buying_time, self.lookahead_limit),
        )?;

        Ok(resolve_outcome(
            &forward,
            buying_price,
            profit_multiplier,
            stop_loss_multiplier,
        ))
    }
}
