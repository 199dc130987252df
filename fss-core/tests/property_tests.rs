//! Property tests for scoring invariants.
//!
//! Uses proptest to verify:
//! 1. Score bounds — FSS and factor panels never leave [0,100]
//! 2. Standardization — per-date z-scores average to zero
//! 3. Kelly bounds — the Kelly fraction never leaves [0,1]
//! 4. Stability bounds — the signal stability rating never leaves [0,1]

use chrono::NaiveDate;
use proptest::prelude::*;

use fss_core::domain::{Panel, Series};
use fss_core::scoring::{signal_stability, ScoringEngine, ScoringInputs};
use fss_core::signals::KellyConfig;
use fss_core::stats;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price_walk(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.05..0.05_f64, len).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .iter()
            .map(|s| {
                price *= 1.0 + s;
                price
            })
            .collect()
    })
}

fn arb_returns(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.1..0.1_f64, len)
}

fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Days::new(i as u64))
        .collect()
}

// ── 1. Score bounds ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// FSS and every factor panel stay inside [0,100] for arbitrary
    /// random-walk universes.
    #[test]
    fn fss_panels_bounded(
        a in arb_price_walk(160),
        b in arb_price_walk(160),
        c in arb_price_walk(160),
    ) {
        let n = 160;
        let ds = dates(n);
        let tickers = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mut values = Vec::with_capacity(n * 3);
        for i in 0..n {
            values.push(a[i]);
            values.push(b[i]);
            values.push(c[i]);
        }
        let prices = Panel::new(ds.clone(), tickers.clone(), values).unwrap();
        let volumes = Panel::filled(ds.clone(), tickers, 2_000_000.0);
        let bench = Series::new(ds, a.clone()).unwrap();

        let panels = ScoringEngine::default()
            .compute_panels(&ScoringInputs {
                prices: &prices,
                volumes: &volumes,
                benchmark: &bench,
                vol_index: None,
                fundamentals: None,
                balance_sheets: None,
                earnings_quality: None,
            })
            .unwrap();

        for panel in [&panels.fss, &panels.trend, &panels.fundamental, &panels.capital_flow, &panels.risk] {
            for d in 0..n {
                for t in 0..3 {
                    let v = panel.get(d, t);
                    prop_assert!((0.0..=100.0).contains(&v), "value {} out of range", v);
                }
            }
        }
    }
}

// ── 2. Standardization ───────────────────────────────────────────────

proptest! {
    /// A cross-sectional z-score has mean zero (or is identically zero for
    /// a degenerate cross-section).
    #[test]
    fn zscore_mean_is_zero(row in prop::collection::vec(-1000.0..1000.0_f64, 2..40)) {
        let z = stats::zscore(&row);
        let mean = stats::mean(&z);
        prop_assert!(mean.abs() < 1e-9, "z-score mean {} not zero", mean);
    }
}

// ── 3. Kelly bounds ──────────────────────────────────────────────────

proptest! {
    /// The Kelly fraction and its quarter-Kelly recommendation never leave
    /// [0,1] no matter the return history.
    #[test]
    fn kelly_fraction_bounded(returns in arb_returns(100)) {
        let r = KellyConfig::default().compute("T", &returns);
        prop_assert!((0.0..=1.0).contains(&r.kelly_fraction));
        prop_assert!((0.0..=1.0).contains(&r.recommended_fraction));
        prop_assert!(r.recommended_fraction <= r.kelly_fraction + 1e-12);
        prop_assert!((0.0..=1.0).contains(&r.win_rate));
    }
}

// ── 4. Stability bounds ──────────────────────────────────────────────

proptest! {
    /// Signal stability is always in [0,1], including degenerate inputs.
    #[test]
    fn stability_bounded(
        scores in prop::collection::vec(0.0..100.0_f64, 300),
        rets in arb_returns(300),
    ) {
        let rating = signal_stability(&scores, &rets);
        prop_assert!((0.0..=1.0).contains(&rating), "rating {} out of range", rating);
    }
}
