//! Entry-signal indicators.

pub mod ema;
pub mod ema_cross;

/// Rounds a price to `digit` decimal places.
pub fn round_to_digit(value: f64, digit: u32) -> f64 {
    let scale = 10f64.powi(digit as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_price_digit() {
        assert_eq!(round_to_digit(1.23456, 2), 1.23);
        assert_eq!(round_to_digit(1.235, 0), 1.0);
        assert_eq!(round_to_digit(0.000456, 4), 0.0005);
    }
}
