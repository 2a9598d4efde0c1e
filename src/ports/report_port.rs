//! Report sink port trait.

use crate::domain::runner::{BacktestReport, SignalRecord};

/// Receives informational output from a backtest run.
///
/// Nothing the sink does feeds back into the run.
pub trait ReportSink {
    fn log_signal(&self, record: &SignalRecord);

    fn log_summary(&self, report: &BacktestReport);
}
