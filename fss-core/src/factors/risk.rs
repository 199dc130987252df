//! Risk & quality factor — volatility rank, balance-sheet strength,
//! drawdown resilience.
//!
//! R = 0.35 · low-volatility score (inverted cross-sectional volatility
//! percentile) + 0.35 · balance-sheet strength (neutral when the bundle
//! carries none) + 0.30 · drawdown resilience (shallower trailing max
//! drawdown scores higher).

use serde::{Deserialize, Serialize};

use super::{
    return_columns, Factor, FactorInputs, FundamentalsBundle, RawSignal, NEUTRAL_SCORE,
};
use crate::domain::Panel;
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Window for realized volatility.
    pub vol_window: usize,
    /// Lookback for the drawdown-resilience sub-signal.
    pub lookback: usize,
    /// Periods per year for annualization.
    pub periods_per_year: usize,
}

impl Default for RiskFactor {
    fn default() -> Self {
        Self {
            vol_window: 20,
            lookback: 126,
            periods_per_year: 252,
        }
    }
}

impl Factor for RiskFactor {
    fn name(&self) -> &'static str {
        "risk"
    }

    fn compute(&self, inputs: &FactorInputs) -> Panel {
        let prices = inputs.prices;
        let n_dates = prices.n_dates();
        let n_tickers = prices.n_tickers();
        let daily = return_columns(prices);

        // Annualized realized volatility per ticker.
        let ann = (self.periods_per_year as f64).sqrt();
        let vol_cols: Vec<Vec<f64>> = (0..n_tickers)
            .map(|t| {
                stats::rolling_std(&daily[t], self.vol_window)
                    .into_iter()
                    .map(|v| v * ann)
                    .collect()
            })
            .collect();

        // Drawdown resilience: most negative drawdown over the lookback.
        // Less negative (shallower) is better, so the raw value standardizes
        // directly — higher dd_min means higher score.
        let dd_cols: Vec<Vec<f64>> = (0..n_tickers)
            .map(|t| {
                let col = prices.column(t);
                let roll_max = stats::rolling_max(&col, self.lookback);
                let dd: Vec<f64> = col
                    .iter()
                    .zip(roll_max.iter())
                    .map(|(&p, &m)| {
                        if p.is_nan() || m.is_nan() {
                            f64::NAN
                        } else {
                            p / (m + 1e-12) - 1.0
                        }
                    })
                    .collect();
                stats::rolling_min(&dd, self.lookback)
            })
            .collect();
        let dd_scores = RawSignal::from_columns(dd_cols, n_dates).standardize();

        // Balance-sheet strength rides along when supplied.
        let balance_scores = match inputs
            .fundamentals
            .and_then(|b| b.get(FundamentalsBundle::BALANCE_SHEET_STRENGTH))
            .filter(|p| p.n_dates() == n_dates && p.tickers() == prices.tickers())
        {
            Some(panel) => {
                let cols = (0..n_tickers).map(|t| panel.column(t)).collect();
                RawSignal::from_columns(cols, n_dates).standardize()
            }
            None => vec![NEUTRAL_SCORE; n_dates * n_tickers],
        };

        let mut out = Panel::filled(
            prices.dates().to_vec(),
            prices.tickers().to_vec(),
            NEUTRAL_SCORE,
        );
        for d in 0..n_dates {
            // Low-volatility score is a cross-sectional percentile rank, not
            // a z-score: 1 - rank keeps the lowest-volatility ticker at 100.
            let row: Vec<f64> = (0..n_tickers).map(|t| vol_cols[t][d]).collect();
            let low_vol = percentile_rank_scores(&row);
            for t in 0..n_tickers {
                let v = 0.35 * low_vol[t]
                    + 0.35 * balance_scores[d * n_tickers + t]
                    + 0.30 * dd_scores[d * n_tickers + t];
                out.set(d, t, if v.is_finite() { v } else { NEUTRAL_SCORE });
            }
        }
        out
    }
}

/// (1 - percentile rank) · 100 across one date's volatilities.
///
/// NaN volatilities (warmup) map to the neutral score.
fn percentile_rank_scores(vols: &[f64]) -> Vec<f64> {
    let valid: Vec<f64> = vols.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.len() < 2 {
        return vec![NEUTRAL_SCORE; vols.len()];
    }
    let ranks = stats::average_ranks(&valid);
    let n = valid.len() as f64;
    let mut iter = ranks.iter();
    vols.iter()
        .map(|v| {
            if v.is_nan() {
                NEUTRAL_SCORE
            } else {
                let pct = iter.next().unwrap() / n;
                (1.0 - pct) * 100.0
            }
        })
        .collect()
}
