//! End-to-end checks on the scoring pipeline: determinism, trailing-only
//! computation, fundamentals handling, and safety annotation.

use chrono::NaiveDate;
use std::collections::HashMap;

use fss_core::domain::{Panel, Series};
use fss_core::factors::{Factor, FactorInputs, FundamentalsBundle, TrendFactor};
use fss_core::safety::BalanceSheetInputs;
use fss_core::scoring::{ScoringConfig, ScoringEngine, ScoringInputs};

fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Days::new(i as u64))
        .collect()
}

/// Three tickers with distinct personalities over 260 periods.
fn universe(n: usize) -> (Panel, Panel, Series) {
    let ds = dates(n);
    let tickers = vec!["GRW".to_string(), "DEC".to_string(), "CHP".to_string()];
    let mut values = Vec::with_capacity(n * 3);
    for i in 0..n {
        values.push(100.0 * 1.0015f64.powi(i as i32));
        values.push(100.0 * 0.9990f64.powi(i as i32));
        values.push(100.0 + 5.0 * (i as f64 / 3.0).sin());
    }
    let prices = Panel::new(ds.clone(), tickers.clone(), values).unwrap();
    let volumes = Panel::filled(ds.clone(), tickers, 3_000_000.0);
    let bench = Series::new(ds, (0..n).map(|i| 100.0 + 0.05 * i as f64).collect()).unwrap();
    (prices, volumes, bench)
}

fn inputs<'a>(prices: &'a Panel, volumes: &'a Panel, bench: &'a Series) -> ScoringInputs<'a> {
    ScoringInputs {
        prices,
        volumes,
        benchmark: bench,
        vol_index: None,
        fundamentals: None,
        balance_sheets: None,
        earnings_quality: None,
    }
}

#[test]
fn scoring_is_deterministic() {
    let (prices, volumes, bench) = universe(260);
    let engine = ScoringEngine::default();
    let tickers: Vec<String> = prices.tickers().to_vec();

    let first = engine
        .score_universe(&inputs(&prices, &volumes, &bench), &tickers)
        .unwrap();
    let second = engine
        .score_universe(&inputs(&prices, &volumes, &bench), &tickers)
        .unwrap();

    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn factor_scores_use_trailing_data_only() {
    // Truncating the history must not change scores on the surviving
    // prefix: every sub-signal is a trailing-window computation.
    let (prices, _, bench) = universe(260);
    let cut = 200;
    let cut_date = prices.dates()[cut];
    let truncated_prices = prices.slice_rows(0, cut);
    let truncated_bench = bench.truncate_before(cut_date);

    let volumes = Panel::filled(prices.dates().to_vec(), prices.tickers().to_vec(), 1.0e6);
    let truncated_volumes = volumes.slice_rows(0, cut);

    let factor = TrendFactor::default();
    let full = factor.compute(&FactorInputs {
        prices: &prices,
        volumes: &volumes,
        benchmark: &bench,
        fundamentals: None,
    });
    let partial = factor.compute(&FactorInputs {
        prices: &truncated_prices,
        volumes: &truncated_volumes,
        benchmark: &truncated_bench,
        fundamentals: None,
    });

    for d in 0..cut {
        for t in 0..prices.n_tickers() {
            let a = full.get(d, t);
            let b = partial.get(d, t);
            assert!(
                (a - b).abs() < 1e-9,
                "trend score changed after truncation at d={d} t={t}: {a} vs {b}"
            );
        }
    }
}

#[test]
fn fundamentals_shift_scores_and_weights() {
    let (prices, volumes, bench) = universe(260);
    let engine = ScoringEngine::default();

    // Without fundamentals the fundamental weight is redistributed away.
    let bare = engine
        .compute_panels(&inputs(&prices, &volumes, &bench))
        .unwrap();
    assert_eq!(bare.weights.fundamental, 0.0);

    // A bundle favoring GRW keeps the fundamental weight in play and lifts
    // GRW's fundamental score above DEC's.
    let mut strong_weak = Panel::filled(prices.dates().to_vec(), prices.tickers().to_vec(), 0.0);
    for d in 0..prices.n_dates() {
        strong_weak.set(d, 0, 1.0);
        strong_weak.set(d, 1, -1.0);
    }
    let mut bundle = FundamentalsBundle::new();
    bundle.insert(FundamentalsBundle::EPS_ACCELERATION, strong_weak.clone());
    bundle.insert(FundamentalsBundle::REVENUE_YOY, strong_weak.clone());
    bundle.insert(FundamentalsBundle::MARGIN_TREND, strong_weak);

    let mut with_funds = inputs(&prices, &volumes, &bench);
    with_funds.fundamentals = Some(&bundle);
    let rich = engine.compute_panels(&with_funds).unwrap();
    assert!(rich.weights.fundamental > 0.0);
    let last = rich.fundamental.n_dates() - 1;
    assert!(rich.fundamental.get(last, 0) > rich.fundamental.get(last, 1));
}

#[test]
fn distressed_ticker_is_scored_but_fails_safety() {
    let (prices, volumes, bench) = universe(260);
    let mut balance_sheets = HashMap::new();
    balance_sheets.insert(
        "GRW".to_string(),
        BalanceSheetInputs {
            working_capital: -200.0,
            retained_earnings: -100.0,
            ebit: -50.0,
            market_value: 100.0,
            sales: 100.0,
            total_assets: 1000.0,
        },
    );

    let mut scoring_inputs = inputs(&prices, &volumes, &bench);
    scoring_inputs.balance_sheets = Some(&balance_sheets);

    let results = ScoringEngine::default()
        .score_universe(&scoring_inputs, &["GRW".to_string(), "DEC".to_string()])
        .unwrap();

    let grw = results.iter().find(|r| r.ticker == "GRW").unwrap();
    assert!(!grw.passed_safety_filters);
    assert!(grw.safety_reason.contains("Financial distress"));
    assert!(grw.fss_score > 0.0, "distressed tickers are still scored");

    // DEC has no balance sheet supplied, so only liquidity applies.
    let dec = results.iter().find(|r| r.ticker == "DEC").unwrap();
    assert!(dec.passed_safety_filters);
}

#[test]
fn weight_override_beats_regime_table() {
    let (prices, volumes, bench) = universe(260);
    let mut config = ScoringConfig::default();
    config.weight_override = Some(fss_core::scoring::FactorWeights {
        trend: 1.0,
        fundamental: 0.0,
        capital_flow: 0.0,
        risk: 0.0,
    });
    let panels = ScoringEngine::new(config)
        .compute_panels(&inputs(&prices, &volumes, &bench))
        .unwrap();

    // With all weight on trend and no interaction rules firing at neutral
    // fundamentals, FSS tracks the trend panel wherever trend is moderate.
    let last = panels.fss.n_dates() - 1;
    for t in 0..prices.n_tickers() {
        let trend = panels.trend.get(last, t);
        if (40.0..=70.0).contains(&trend) {
            assert!((panels.fss.get(last, t) - trend).abs() < 1e-9);
        }
    }
}
