//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k). Only seeded values are returned, so the
//! output holds `values.len() - period + 1` points.

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);

    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out.push(ema);

    for &value in &values[period..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}
