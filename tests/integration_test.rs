mod common;

use approx::assert_relative_eq;
use common::*;
use scalpcheck::adapters::csv_adapter::{CsvMarketData, FILTERS_FILE};
use scalpcheck::domain::candle::Granularity;
use scalpcheck::domain::error::ScalpcheckError;
use scalpcheck::domain::indicator::ema_cross::EmaCrossSignal;
use scalpcheck::domain::outcome::OutcomeKind;
use scalpcheck::domain::runner::{BacktestConfig, BacktestRunner};
use scalpcheck::ports::data_port::CandleQuery;

const SYMBOL: &str = "BTCUSDT";

fn config() -> BacktestConfig {
    BacktestConfig {
        warmup: 1,
        ..BacktestConfig::new(SYMBOL, COARSE, 1.02, 0.99)
    }
}

#[test]
fn books_signals_in_coarse_order() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let report = runner.run(&config()).unwrap();

    assert_eq!(sink.coarse_indices(), vec![5, 9]);
    let signals = sink.signals.borrow();

    assert_eq!(signals[0].buying_price, 101.0);
    assert_eq!(
        signals[0].buying_time,
        (minute_in_bar(5, 3) as i64 + 1) * MINUTE - 1
    );
    assert_eq!(signals[0].outcome.kind, OutcomeKind::ProfitHit);
    assert_relative_eq!(signals[0].outcome.profit, 0.02);
    assert_eq!(signals[0].outcome.exit_index, Some(1));

    assert_eq!(signals[1].outcome.kind, OutcomeKind::LossHit);
    assert_relative_eq!(signals[1].outcome.profit, -0.01);

    assert_eq!(report.stats.signal_count, 2);
    assert_eq!(report.stats.profit_hits, 1);
    assert_eq!(report.stats.loss_hits, 1);
}

#[test]
fn summary_counts_green_bars_and_profit() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let report = runner.run(&config()).unwrap();

    // Bar 5 green then red bar 6; bar 9 green then green bar 10
    assert_eq!(report.stats.first_candle_increase, 2);
    assert_eq!(report.stats.next_candle_increase, 1);
    assert_eq!(report.stats.first_and_next_candle_increase, 1);

    let summary = &report.summary;
    assert_relative_eq!(summary.current_green_pct.unwrap(), 100.0);
    assert_relative_eq!(summary.next_green_pct.unwrap(), 50.0);
    assert_relative_eq!(summary.both_green_pct.unwrap(), 50.0);
    assert_relative_eq!(summary.total_profit_pct, 1.0);
    assert_relative_eq!(summary.average_profit_pct.unwrap(), 0.5);

    let summaries = sink.summaries.borrow();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0], report);
}

#[test]
fn scans_each_bar_over_its_own_time_range() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    runner.run(&config()).unwrap();

    let queries = data.queries.borrow();
    assert_eq!(queries[0], (COARSE, CandleQuery::latest(700)));

    let bar_ms = COARSE.duration_ms();
    let scans: Vec<CandleQuery> = queries
        .iter()
        .filter(|(g, q)| *g == Granularity::FINER && q.end_time.is_some())
        .map(|(_, q)| *q)
        .collect();
    // Bars 1..=10 are evaluated; bar 11 has no successor
    assert_eq!(scans.len(), 10);
    assert_eq!(scans[0], CandleQuery::range(bar_ms, 2 * bar_ms - 1));
    assert_eq!(scans[9], CandleQuery::range(10 * bar_ms, 11 * bar_ms - 1));

    let forwards = queries
        .iter()
        .filter(|(g, q)| *g == Granularity::FINER && q.end_time.is_none())
        .count();
    assert_eq!(forwards, 2);
}

#[test]
fn warmup_skips_early_signals() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let config = BacktestConfig {
        warmup: 6,
        ..config()
    };
    let report = runner.run(&config).unwrap();

    assert_eq!(sink.coarse_indices(), vec![9]);
    assert_eq!(report.stats.signal_count, 1);
}

#[test]
fn no_signals_gives_empty_summary() {
    let data = MockMarketData::new()
        .with_price_digit(SYMBOL, 2)
        .with_candles(SYMBOL, COARSE, coarse_bars(12, &[]))
        .with_candles(SYMBOL, Granularity::FINER, flat_minutes(12 * BAR_MINUTES, 100.0));
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let report = runner.run(&config()).unwrap();

    assert!(sink.signals.borrow().is_empty());
    assert_eq!(report.summary.signal_count, 0);
    assert_eq!(report.summary.current_green_pct, None);
    assert_eq!(report.summary.average_profit_pct, None);
    assert_eq!(report.summary.total_profit_pct, 0.0);
    assert_eq!(sink.summaries.borrow().len(), 1);
}

#[test]
fn short_history_evaluates_nothing() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let config = BacktestConfig {
        warmup: 11,
        ..config()
    };
    let report = runner.run(&config).unwrap();
    assert_eq!(report.stats.signal_count, 0);

    let config = BacktestConfig {
        history_limit: 3,
        warmup: 5,
        ..config
    };
    let report = runner.run(&config).unwrap();
    assert_eq!(report.stats.signal_count, 0);
}

#[test]
fn history_limit_keeps_latest_bars() {
    let data = two_signal_market(SYMBOL);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    // Last six bars are 6..=11, so the bar 5 entry falls outside
    let config = BacktestConfig {
        history_limit: 6,
        ..config()
    };
    runner.run(&config).unwrap();

    // Bar 9 sits at index 3 of the fetched history
    assert_eq!(sink.coarse_indices(), vec![3]);
}

#[test]
fn open_trade_counts_as_unresolved() {
    let mut minutes = flat_minutes(12 * BAR_MINUTES, 100.0);
    let entry = minute_in_bar(10, 14);
    minutes[entry] = minute(entry, 100.0, 101.0, 100.0, 101.0);

    let data = MockMarketData::new()
        .with_price_digit(SYMBOL, 2)
        .with_candles(SYMBOL, COARSE, coarse_bars(12, &[11]))
        .with_candles(SYMBOL, Granularity::FINER, minutes);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let report = runner.run(&config()).unwrap();

    assert_eq!(sink.coarse_indices(), vec![10]);
    let signals = sink.signals.borrow();
    assert_eq!(signals[0].outcome.kind, OutcomeKind::Unresolved);
    assert_eq!(signals[0].outcome.profit, 0.0);
    assert_eq!(report.stats.unresolved, 1);
    assert_eq!(report.summary.next_green_pct, Some(0.0));
    assert_eq!(report.summary.average_profit_pct, Some(0.0));
}

#[test]
fn unknown_symbol_aborts_before_fetching_candles() {
    let data = two_signal_market("ETHUSDT");
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let err = runner.run(&config()).unwrap_err();

    assert!(matches!(err, ScalpcheckError::UnknownSymbol { symbol } if symbol == SYMBOL));
    assert!(data.queries.borrow().is_empty());
    assert!(sink.summaries.borrow().is_empty());
}

#[test]
fn retrieval_failures_abort_the_run() {
    for fetch in [Fetch::Filters, Fetch::History, Fetch::Scan, Fetch::Forward] {
        let data = two_signal_market(SYMBOL).with_error(fetch, "connection reset");
        let sink = RecordingSink::new();
        let runner = BacktestRunner::new(&data, &green_minute, &sink);

        let err = runner.run(&config()).unwrap_err();

        assert!(err.is_retrieval(), "{fetch:?} should surface a retrieval error");
        assert!(
            sink.summaries.borrow().is_empty(),
            "{fetch:?} should not log a summary"
        );
        assert!(sink.signals.borrow().is_empty());
    }
}

#[test]
fn failure_after_first_signal_drops_the_report() {
    // The second entry closes bar 9 and its forward window reaches a
    // malformed candle in bar 10, so only the first signal is logged
    let mut minutes = flat_minutes(12 * BAR_MINUTES, 100.0);
    let first = minute_in_bar(5, 3);
    minutes[first] = minute(first, 100.0, 101.0, 100.0, 101.0);
    minutes[first + 1] = minute(first + 1, 100.0, 104.0, 100.0, 100.0);
    let second = minute_in_bar(9, 14);
    minutes[second] = minute(second, 100.0, 101.0, 100.0, 101.0);
    let broken = minute_in_bar(10, 1);
    minutes[broken].close_time = minutes[broken].open_time;

    let data = MockMarketData::new()
        .with_price_digit(SYMBOL, 2)
        .with_candles(SYMBOL, COARSE, coarse_bars(12, &[6]))
        .with_candles(SYMBOL, Granularity::FINER, minutes);
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let config = BacktestConfig {
        lookahead_limit: 5,
        ..config()
    };
    let err = runner.run(&config).unwrap_err();

    assert!(matches!(err, ScalpcheckError::MalformedSeries { .. }));
    assert_eq!(sink.coarse_indices(), vec![5]);
    assert!(sink.summaries.borrow().is_empty());
}

#[test]
fn ema_cross_on_flat_prices_never_fires() {
    let data = MockMarketData::new()
        .with_price_digit(SYMBOL, 2)
        .with_candles(SYMBOL, COARSE, coarse_bars(40, &[]))
        .with_candles(SYMBOL, Granularity::FINER, flat_minutes(40 * BAR_MINUTES, 100.0));
    let sink = RecordingSink::new();
    let indicator = EmaCrossSignal::default();
    let runner = BacktestRunner::new(&data, &indicator, &sink);

    let report = runner
        .run(&BacktestConfig {
            warmup: 25,
            ..config()
        })
        .unwrap();

    assert_eq!(report.stats.signal_count, 0);
}

#[test]
fn csv_market_data_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    write_candles_csv(&dir.path().join("BTCUSDT_15m.csv"), &coarse_bars(12, &[6]));
    write_candles_csv(&dir.path().join("BTCUSDT_1m.csv"), &two_signal_minutes());
    std::fs::write(
        dir.path().join(FILTERS_FILE),
        "symbol,tick_size\nBTCUSDT,0.01000000\n",
    )
    .unwrap();

    let data = CsvMarketData::new(dir.path().to_path_buf());
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let report = runner.run(&config()).unwrap();

    assert_eq!(sink.coarse_indices(), vec![5, 9]);
    assert_eq!(report.stats.profit_hits, 1);
    assert_eq!(report.stats.loss_hits, 1);
    assert_relative_eq!(report.summary.total_profit_pct, 1.0);
}

#[test]
fn csv_missing_interval_file_is_retrieval_error() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(FILTERS_FILE),
        "symbol,tick_size\nBTCUSDT,0.01\n",
    )
    .unwrap();

    let data = CsvMarketData::new(dir.path().to_path_buf());
    let sink = RecordingSink::new();
    let runner = BacktestRunner::new(&data, &green_minute, &sink);

    let err = runner.run(&config()).unwrap_err();
    assert!(err.is_retrieval());
}
