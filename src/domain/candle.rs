//! Candle and candle series representation.

use crate::domain::error::ScalpcheckError;
use std::fmt;
use std::str::FromStr;

const MINUTE_MS: i64 = 60_000;

/// Candle interval as named by the exchange (`1m`, `15m`, `4h`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    FourHours,
    SixHours,
    EightHours,
    TwelveHours,
    OneDay,
    ThreeDays,
    OneWeek,
}

impl Granularity {
    /// Granularity used for intra-bar scanning and outcome resolution.
    pub const FINER: Granularity = Granularity::OneMinute;

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::OneMinute => "1m",
            Granularity::ThreeMinutes => "3m",
            Granularity::FiveMinutes => "5m",
            Granularity::FifteenMinutes => "15m",
            Granularity::ThirtyMinutes => "30m",
            Granularity::OneHour => "1h",
            Granularity::TwoHours => "2h",
            Granularity::FourHours => "4h",
            Granularity::SixHours => "6h",
            Granularity::EightHours => "8h",
            Granularity::TwelveHours => "12h",
            Granularity::OneDay => "1d",
            Granularity::ThreeDays => "3d",
            Granularity::OneWeek => "1w",
        }
    }

    /// Nominal bar length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        let minutes = match self {
            Granularity::OneMinute => 1,
            Granularity::ThreeMinutes => 3,
            Granularity::FiveMinutes => 5,
            Granularity::FifteenMinutes => 15,
            Granularity::ThirtyMinutes => 30,
            Granularity::OneHour => 60,
            Granularity::TwoHours => 120,
            Granularity::FourHours => 240,
            Granularity::SixHours => 360,
            Granularity::EightHours => 480,
            Granularity::TwelveHours => 720,
            Granularity::OneDay => 1_440,
            Granularity::ThreeDays => 4_320,
            Granularity::OneWeek => 10_080,
        };
        minutes * MINUTE_MS
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interval: {0}")]
pub struct UnknownGranularity(pub String);

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Granularity::OneMinute),
            "3m" => Ok(Granularity::ThreeMinutes),
            "5m" => Ok(Granularity::FiveMinutes),
            "15m" => Ok(Granularity::FifteenMinutes),
            "30m" => Ok(Granularity::ThirtyMinutes),
            "1h" => Ok(Granularity::OneHour),
            "2h" => Ok(Granularity::TwoHours),
            "4h" => Ok(Granularity::FourHours),
            "6h" => Ok(Granularity::SixHours),
            "8h" => Ok(Granularity::EightHours),
            "12h" => Ok(Granularity::TwelveHours),
            "1d" => Ok(Granularity::OneDay),
            "3d" => Ok(Granularity::ThreeDays),
            "1w" => Ok(Granularity::OneWeek),
            other => Err(UnknownGranularity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_price: f64,
    pub close_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub open_time: i64,
    pub close_time: i64,
}

impl Candle {
    /// Closed above its open.
    pub fn is_green(&self) -> bool {
        self.close_price > self.open_price
    }
}

/// Ordered candles for one symbol at one granularity.
///
/// Every candle carries all six fields, so the column views returned by
/// [`open_prices`](Self::open_prices) and friends are always index-aligned.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    pub symbol: String,
    pub granularity: Granularity,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Builds a series, rejecting out-of-order or zero-length candles.
    pub fn new(
        symbol: impl Into<String>,
        granularity: Granularity,
        candles: Vec<Candle>,
    ) -> Result<Self, ScalpcheckError> {
        let symbol = symbol.into();

        for (i, candle) in candles.iter().enumerate() {
            if candle.close_time <= candle.open_time {
                return Err(ScalpcheckError::MalformedSeries {
                    symbol,
                    reason: format!(
                        "candle {} closes at {} but opens at {}",
                        i, candle.close_time, candle.open_time
                    ),
                });
            }
        }

        if let Some(i) = candles
            .windows(2)
            .position(|pair| pair[1].open_time < pair[0].open_time)
        {
            return Err(ScalpcheckError::MalformedSeries {
                symbol,
                reason: format!("open_time decreases at index {}", i + 1),
            });
        }

        Ok(Self {
            symbol,
            granularity,
            candles,
        })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn open_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open_price).collect()
    }

    pub fn close_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close_price).collect()
    }

    pub fn high_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high_price).collect()
    }

    pub fn low_prices(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low_price).collect()
    }

    pub fn open_times(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.open_time).collect()
    }

    pub fn close_times(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.close_time).collect()
    }
}
