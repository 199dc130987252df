//! Property tests for allocator invariants.
//!
//! Whatever the candidate inputs and strategy, a successful allocation is a
//! fully-invested long-only book: weights sum to one, every position is
//! positive and finite, and the diagnostics stay in their documented ranges.

use chrono::NaiveDate;
use proptest::prelude::*;

use fss_core::domain::Panel;
use fss_runner::{AllocationMethod, PortfolioAllocator, TickerInputs};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_inputs() -> impl Strategy<Value = Vec<TickerInputs>> {
    prop::collection::vec(
        (0.0..1.0f64, 0.0..100.0f64, 0.0..1.0f64, 0.05..0.6f64),
        2..8,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(k, (kelly, fss, rob, vol))| TickerInputs {
                ticker: format!("T{k}"),
                kelly_fraction: kelly,
                fss_score: fss,
                robustness: rob,
                volatility: vol,
            })
            .collect()
    })
}

fn arb_method() -> impl Strategy<Value = AllocationMethod> {
    prop_oneof![
        Just(AllocationMethod::KellyConstrained),
        Just(AllocationMethod::RiskParity),
        Just(AllocationMethod::MeanVariance),
    ]
}

/// Deterministic sine return streams, one frequency per ticker slot.
fn returns_panel(n_tickers: usize) -> Panel {
    let n = 120;
    let dates: Vec<NaiveDate> = (0..n)
        .map(|i| NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Days::new(i as u64))
        .collect();
    let tickers: Vec<String> = (0..n_tickers).map(|k| format!("T{k}")).collect();
    let mut values = Vec::with_capacity(n * n_tickers);
    for d in 0..n {
        for k in 0..n_tickers {
            let freq = 0.3 + 0.4 * k as f64;
            values.push(0.01 * (freq * d as f64).sin());
        }
    }
    Panel::new(dates, tickers, values).unwrap()
}

// ── Invariants ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every allocation is fully invested and long-only, under every
    /// strategy and any candidate inputs.
    #[test]
    fn weights_form_a_long_only_book(inputs in arb_inputs(), method in arb_method()) {
        let returns = returns_panel(inputs.len());
        let result = PortfolioAllocator::default()
            .allocate(&inputs, &returns, method)
            .unwrap();

        prop_assert_eq!(result.weights.len(), inputs.len());
        let total: f64 = result.weights.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-6, "weights sum to {}", total);
        for (ticker, &w) in &result.weights {
            prop_assert!(w.is_finite() && w > 0.0 && w <= 1.0, "{} weight {}", ticker, w);
        }
    }

    /// Diagnostics stay in their documented ranges.
    #[test]
    fn diagnostics_are_bounded(inputs in arb_inputs(), method in arb_method()) {
        let returns = returns_panel(inputs.len());
        let result = PortfolioAllocator::default()
            .allocate(&inputs, &returns, method)
            .unwrap();

        prop_assert!((0.0..=1.0).contains(&result.diversification_score));
        prop_assert!(result.expected_volatility >= 0.0);
        prop_assert!(result.max_drawdown_estimate >= 0.0);
        prop_assert!(result.expected_return.is_finite());
    }
}
