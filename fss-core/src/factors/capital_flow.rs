//! Capital-flow factor — volume-confirmed price action.
//!
//! C = 0.30 · volume-price trend + 0.30 · volume breakout + 0.25 ·
//! accumulation/distribution proxy + 0.15 · options-flow bias (neutral when
//! the bundle carries none).

use serde::{Deserialize, Serialize};

use super::{
    blend_scores, return_columns, Factor, FactorInputs, FundamentalsBundle, RawSignal,
};
use crate::domain::Panel;
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalFlowFactor {
    /// Rolling window for all volume aggregates.
    pub window: usize,
}

impl Default for CapitalFlowFactor {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl Factor for CapitalFlowFactor {
    fn name(&self) -> &'static str {
        "capital_flow"
    }

    fn compute(&self, inputs: &FactorInputs) -> Panel {
        let prices = inputs.prices;
        let volumes = inputs.volumes;
        let n_dates = prices.n_dates();
        let n_tickers = prices.n_tickers();
        let daily = return_columns(prices);

        let mut vpt_cols = Vec::with_capacity(n_tickers);
        let mut breakout_cols = Vec::with_capacity(n_tickers);
        let mut accum_cols = Vec::with_capacity(n_tickers);

        for t in 0..n_tickers {
            let vol = volumes.column(t);

            // Volume-price trend: volume-weighted return sum over the window,
            // scaled by average volume.
            let weighted: Vec<f64> = daily[t]
                .iter()
                .zip(vol.iter())
                .map(|(&r, &v)| if r.is_nan() { f64::NAN } else { r * v })
                .collect();
            let vpt_num = stats::rolling_sum_min1(&weighted, self.window);
            let vol_avg_min1 = stats::rolling_mean_min1(&vol, self.window);
            vpt_cols.push(
                vpt_num
                    .iter()
                    .zip(vol_avg_min1.iter())
                    .map(|(&n, &d)| n / (d + 1e-12))
                    .collect(),
            );

            // Volume breakout: today's volume vs the trailing average.
            let vol_avg = stats::rolling_mean(&vol, self.window);
            breakout_cols.push(
                vol.iter()
                    .zip(vol_avg.iter())
                    .map(|(&v, &a)| if a.is_nan() { f64::NAN } else { v / (a + 1e-12) })
                    .collect(),
            );

            // Accumulation/distribution proxy: up-day volume minus down-day
            // volume over the window.
            let signed: Vec<f64> = daily[t]
                .iter()
                .zip(vol.iter())
                .map(|(&r, &v)| {
                    if r.is_nan() {
                        f64::NAN
                    } else if r > 0.0 {
                        v
                    } else {
                        -v
                    }
                })
                .collect();
            accum_cols.push(stats::rolling_sum_min1(&signed, self.window));
        }

        // Options-flow bias rides along when supplied; a flat neutral matrix
        // standardizes to 50 everywhere otherwise.
        let bias_cols: Vec<Vec<f64>> = match inputs
            .fundamentals
            .and_then(|b| b.get(FundamentalsBundle::OPTIONS_FLOW_BIAS))
            .filter(|p| p.n_dates() == n_dates && p.tickers() == prices.tickers())
        {
            Some(bias) => (0..n_tickers).map(|t| bias.column(t)).collect(),
            None => (0..n_tickers).map(|_| vec![f64::NAN; n_dates]).collect(),
        };

        blend_scores(
            prices,
            &[
                (0.30, RawSignal::from_columns(vpt_cols, n_dates)),
                (0.30, RawSignal::from_columns(breakout_cols, n_dates)),
                (0.25, RawSignal::from_columns(accum_cols, n_dates)),
                (0.15, RawSignal::from_columns(bias_cols, n_dates)),
            ],
        )
    }
}
