//! Domain error types.

/// Top-level error type for scalpcheck.
#[derive(Debug, thiserror::Error)]
pub enum ScalpcheckError {
    #[error("market data retrieval failed: {reason}")]
    Retrieval { reason: String },

    #[error("malformed candle series for {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },

    #[error("no exchange filters for symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("invalid price window: {reason}")]
    InvalidWindow { reason: String },

    #[error("invalid time range: start {start_time} is not before end {end_time}")]
    InvalidTimeRange { start_time: i64, end_time: i64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScalpcheckError {
    /// True for failures of the data source rather than of the caller's input.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            ScalpcheckError::Retrieval { .. } | ScalpcheckError::MalformedSeries { .. }
        )
    }
}

impl From<&ScalpcheckError> for std::process::ExitCode {
    fn from(err: &ScalpcheckError) -> Self {
        let code: u8 = match err {
            ScalpcheckError::Io(_) => 1,
            ScalpcheckError::ConfigParse { .. }
            | ScalpcheckError::ConfigMissing { .. }
            | ScalpcheckError::ConfigInvalid { .. } => 2,
            ScalpcheckError::Retrieval { .. } | ScalpcheckError::MalformedSeries { .. } => 3,
            ScalpcheckError::InvalidWindow { .. } | ScalpcheckError::InvalidTimeRange { .. } => 4,
            ScalpcheckError::UnknownSymbol { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
