//! Entry-signal indicator port trait.

/// Judges whether the current price window warrants opening a position.
///
/// Implementations must be pure functions of their arguments: the scanner
/// calls `evaluate` once per slide and relies on identical windows giving
/// identical answers.
pub trait EntrySignal {
    fn evaluate(&self, open_prices: &[f64], close_prices: &[f64], price_digit: u32) -> bool;
}

impl<F> EntrySignal for F
where
    F: Fn(&[f64], &[f64], u32) -> bool,
{
    fn evaluate(&self, open_prices: &[f64], close_prices: &[f64], price_digit: u32) -> bool {
        self(open_prices, close_prices, price_digit)
    }
}
