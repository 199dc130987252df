//! Walk-forward backtester integration tests: no-look-ahead, cost drag, and
//! the observation log.

use fss_runner::synthetic::{make_universe, PricePattern};
use fss_runner::{BacktestError, Phase, WalkForwardBacktester, WalkForwardConfig};

fn universe_patterns() -> Vec<(&'static str, PricePattern)> {
    vec![
        ("GRW", PricePattern::Trending { daily_drift: 0.0015, noise: 0.008 }),
        ("MOM", PricePattern::Trending { daily_drift: 0.0010, noise: 0.010 }),
        ("REV", PricePattern::MeanReverting { level: 100.0, pull: 0.1, noise: 0.012 }),
        ("RWA", PricePattern::RandomWalk { noise: 0.015 }),
        ("RWB", PricePattern::RandomWalk { noise: 0.012 }),
    ]
}

fn test_config() -> WalkForwardConfig {
    WalkForwardConfig {
        training_window: 252,
        rebalance_every: 21,
        // Synthetic universes rarely clear the production robustness bar;
        // these tests exercise the mechanics, not the alpha.
        min_robustness: 0.0,
        top_n: 5,
        ..Default::default()
    }
}

fn tickers() -> Vec<String> {
    universe_patterns().iter().map(|(t, _)| t.to_string()).collect()
}

#[test]
fn backtest_runs_to_completion() {
    let (prices, volumes, benchmark) = make_universe(11, 340, &universe_patterns());
    let backtester = WalkForwardBacktester::new(test_config());
    let result = backtester
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap();

    assert_eq!(result.final_phase, Phase::Complete);
    assert_eq!(result.equity_curve.len(), prices.n_dates());
    assert_eq!(result.drawdown.len(), prices.n_dates());
    assert_eq!(result.equity_curve[0], 100_000.0);
    assert!(result.equity_curve.iter().all(|e| e.is_finite() && *e > 0.0));
    assert!(!result.rebalance_dates.is_empty());
    assert!(result.drawdown.iter().all(|d| *d <= 0.0));
}

#[test]
fn rebalances_see_only_past_data() {
    // A run over a longer panel must produce the same allocation at a shared
    // rebalance date as a run over the panel truncated just after it: the
    // extra future rows may not leak into training.
    let (prices, volumes, benchmark) = make_universe(11, 340, &universe_patterns());
    let backtester = WalkForwardBacktester::new(test_config());

    let full = backtester
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap();

    let cut = 280;
    let short_prices = prices.slice_rows(0, cut);
    let short_volumes = volumes.slice_rows(0, cut);
    let short_benchmark = fss_core::domain::Series::new(
        prices.dates()[..cut].to_vec(),
        benchmark.values()[..cut].to_vec(),
    )
    .unwrap();
    let short = backtester
        .run(&short_prices, &short_volumes, &short_benchmark, None, &tickers())
        .unwrap();

    let first_date = full.rebalance_dates[0];
    assert_eq!(short.rebalance_dates[0], first_date);
    assert_eq!(
        full.allocations_by_date[&first_date],
        short.allocations_by_date[&first_date],
    );
    assert_eq!(
        full.robustness_by_date[&first_date],
        short.robustness_by_date[&first_date],
    );
}

#[test]
fn transaction_costs_drag_on_equity() {
    let (prices, volumes, benchmark) = make_universe(11, 340, &universe_patterns());

    let free = WalkForwardBacktester::new(WalkForwardConfig {
        transaction_cost_bps: 0.0,
        ..test_config()
    })
    .run(&prices, &volumes, &benchmark, None, &tickers())
    .unwrap();
    let taxed = WalkForwardBacktester::new(WalkForwardConfig {
        transaction_cost_bps: 50.0,
        ..test_config()
    })
    .run(&prices, &volumes, &benchmark, None, &tickers())
    .unwrap();

    // Costs change nothing upstream of settlement.
    assert_eq!(free.allocations_by_date, taxed.allocations_by_date);
    assert!(free.avg_turnover > 0.0);
    let last = free.equity_curve.len() - 1;
    assert!(free.equity_curve[last] > taxed.equity_curve[last]);
}

#[test]
fn observation_log_matches_held_positions() {
    let (prices, volumes, benchmark) = make_universe(11, 340, &universe_patterns());
    let backtester = WalkForwardBacktester::new(test_config());
    let result = backtester
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap();

    assert!(!result.observations.is_empty());
    for obs in &result.observations {
        assert!(result.rebalance_dates.contains(&obs.date));
        assert!(obs.weight > 0.0);
        assert!((0.0..=1.0).contains(&obs.robustness));
        assert!(obs.forward_return.is_finite());
        let allocation = &result.allocations_by_date[&obs.date];
        assert_eq!(allocation[&obs.ticker], obs.weight);
    }
    let high_low = &result.robustness_summary;
    assert_eq!(
        high_low.high.count + high_low.low.count,
        result.observations.len()
    );
    assert!(result.avg_position_count >= 1.0);
}

#[test]
fn reruns_are_deterministic() {
    let (prices, volumes, benchmark) = make_universe(11, 320, &universe_patterns());
    let backtester = WalkForwardBacktester::new(test_config());
    let a = backtester
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap();
    let b = backtester
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn short_history_is_rejected() {
    let (prices, volumes, benchmark) = make_universe(11, 100, &universe_patterns());
    let err = WalkForwardBacktester::new(test_config())
        .run(&prices, &volumes, &benchmark, None, &tickers())
        .unwrap_err();
    assert!(matches!(err, BacktestError::InsufficientHistory { .. }));
}
