//! Trend factor — risk-adjusted momentum, relative strength, trend stability.
//!
//! T = 0.50 · risk-adjusted momentum (Sharpe-like ratio of the lookback
//! return to realized volatility) + 0.25 · relative strength vs benchmark
//! + 0.25 · fraction of the trailing window spent above the 50-period SMA.

use serde::{Deserialize, Serialize};

use super::{blend_scores, return_columns, Factor, FactorInputs, RawSignal};
use crate::domain::Panel;
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendFactor {
    /// Momentum lookback in periods (~6 months of trading days).
    pub lookback: usize,
    /// Moving-average period for the trend-stability sub-signal.
    pub ma_period: usize,
}

impl Default for TrendFactor {
    fn default() -> Self {
        Self {
            lookback: 126,
            ma_period: 50,
        }
    }
}

impl Factor for TrendFactor {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn compute(&self, inputs: &FactorInputs) -> Panel {
        let prices = inputs.prices;
        let n_dates = prices.n_dates();
        let momentum = prices.pct_change(self.lookback);
        let daily = return_columns(prices);

        // Risk-adjusted momentum: lookback return over realized volatility.
        let mut sharpe_cols = Vec::with_capacity(prices.n_tickers());
        for t in 0..prices.n_tickers() {
            let vol = stats::rolling_std_min1(&daily[t], self.lookback);
            let col: Vec<f64> = (0..n_dates)
                .map(|d| {
                    let m = momentum.get(d, t);
                    if m.is_nan() {
                        f64::NAN
                    } else {
                        m / (vol[d] * (self.lookback as f64).sqrt() + 1e-12)
                    }
                })
                .collect();
            sharpe_cols.push(col);
        }

        // Relative strength: ticker momentum minus benchmark momentum.
        // A benchmark that does not cover the panel dates degrades this
        // sub-signal to neutral instead of failing the factor.
        let bench_mom = if inputs.benchmark.len() == n_dates {
            inputs.benchmark.pct_change(self.lookback)
        } else {
            vec![f64::NAN; n_dates]
        };
        let rs_cols: Vec<Vec<f64>> = (0..prices.n_tickers())
            .map(|t| {
                (0..n_dates)
                    .map(|d| momentum.get(d, t) - bench_mom[d])
                    .collect()
            })
            .collect();

        // Trend stability: share of the window above the moving average.
        let stability_cols: Vec<Vec<f64>> = (0..prices.n_tickers())
            .map(|t| {
                let col = prices.column(t);
                let ma = stats::rolling_mean(&col, self.ma_period);
                let above: Vec<f64> = col
                    .iter()
                    .zip(ma.iter())
                    .map(|(&p, &m)| {
                        if p.is_nan() || m.is_nan() {
                            f64::NAN
                        } else if p > m {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect();
                stats::rolling_mean(&above, self.lookback)
            })
            .collect();

        blend_scores(
            prices,
            &[
                (0.50, RawSignal::from_columns(sharpe_cols, n_dates)),
                (0.25, RawSignal::from_columns(rs_cols, n_dates)),
                (0.25, RawSignal::from_columns(stability_cols, n_dates)),
            ],
        )
    }
}
