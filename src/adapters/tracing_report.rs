//! Report sink emitting structured `tracing` events.

use crate::domain::outcome::OutcomeKind;
use crate::domain::runner::{BacktestReport, SignalRecord};
use crate::domain::stats::format_pct;
use crate::ports::report_port::ReportSink;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn log_signal(&self, record: &SignalRecord) {
        let status = match record.outcome.kind {
            OutcomeKind::ProfitHit => "take_profit",
            OutcomeKind::LossHit => "stop_loss",
            OutcomeKind::Tie => "tie",
            OutcomeKind::Unresolved => "open",
        };
        info!(
            symbol = %record.symbol,
            coarse_index = record.coarse_index,
            buying_price = record.buying_price,
            profit_pct = record.profit_pct(),
            status,
            entry_time = %record.entry_time(),
            "buy signal"
        );
    }

    fn log_summary(&self, report: &BacktestReport) {
        let summary = &report.summary;
        let stats = &report.stats;
        info!(
            symbol = %report.symbol,
            interval = %report.interval,
            signals = summary.signal_count,
            current_green = %format_pct(summary.current_green_pct),
            next_green = %format_pct(summary.next_green_pct),
            both_green = %format_pct(summary.both_green_pct),
            total_profit_pct = summary.total_profit_pct,
            average_profit_pct = %format_pct(summary.average_profit_pct),
            take_profit_hits = stats.profit_hits,
            stop_loss_hits = stats.loss_hits,
            ties = stats.ties,
            open = stats.unresolved,
            "backtest summary"
        );
    }
}
