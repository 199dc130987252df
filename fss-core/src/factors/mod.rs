//! Factor components — four independent transforms from raw panels to
//! cross-sectionally comparable 0–100 scores.
//!
//! Each factor blends 2–4 sub-signals. A sub-signal is computed per ticker
//! from trailing windows only, then standardized per date across tickers
//! (z-score) and mapped linearly from a clipped [-3σ, +3σ] window onto
//! [0, 100]. Missing values land on the neutral score 50, never on NaN.

mod capital_flow;
mod fundamental;
mod risk;
mod trend;

pub use capital_flow::CapitalFlowFactor;
pub use fundamental::FundamentalFactor;
pub use risk::RiskFactor;
pub use trend::TrendFactor;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Panel, Series};
use crate::stats;

/// Z-score clip window for the linear [0, 100] mapping.
pub const CLIP_Z: f64 = 3.0;

/// Neutral factor score.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Fundamental metric panels, forward-filled from quarterly reports to the
/// daily grid by the external data pipeline.
///
/// Known metric names are the `pub const` keys below; unknown names are
/// carried but ignored by the built-in factors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsBundle {
    metrics: HashMap<String, Panel>,
}

impl FundamentalsBundle {
    pub const EPS_ACCELERATION: &'static str = "eps_acceleration";
    pub const REVENUE_YOY: &'static str = "revenue_yoy";
    pub const MARGIN_TREND: &'static str = "margin_trend";
    pub const BALANCE_SHEET_STRENGTH: &'static str = "balance_sheet_strength";
    pub const OPTIONS_FLOW_BIAS: &'static str = "options_flow_bias";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, panel: Panel) {
        self.metrics.insert(name.into(), panel);
    }

    pub fn get(&self, name: &str) -> Option<&Panel> {
        self.metrics.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Read-only inputs shared by every factor.
#[derive(Debug, Clone, Copy)]
pub struct FactorInputs<'a> {
    pub prices: &'a Panel,
    pub volumes: &'a Panel,
    pub benchmark: &'a Series,
    pub fundamentals: Option<&'a FundamentalsBundle>,
}

/// A factor component: panels in, date×ticker score panel in [0, 100] out.
pub trait Factor {
    fn name(&self) -> &'static str;
    fn compute(&self, inputs: &FactorInputs) -> Panel;
}

// ─── Shared sub-signal plumbing ──────────────────────────────────────

/// Raw (unstandardized) sub-signal matrix with the same shape as the panel
/// it was derived from.
pub(crate) struct RawSignal {
    pub values: Vec<f64>,
    pub n_tickers: usize,
}

impl RawSignal {
    pub fn from_columns(columns: Vec<Vec<f64>>, n_dates: usize) -> Self {
        let n_tickers = columns.len();
        let mut values = vec![f64::NAN; n_dates * n_tickers];
        for (t, col) in columns.iter().enumerate() {
            for (d, &v) in col.iter().enumerate() {
                values[d * n_tickers + t] = v;
            }
        }
        Self { values, n_tickers }
    }

    /// Standardize each date's cross-section and map onto [0, 100].
    ///
    /// NaN cells and zero-variance cross-sections become exactly 50.
    pub fn standardize(&self) -> Vec<f64> {
        let n = self.n_tickers;
        let n_dates = if n == 0 { 0 } else { self.values.len() / n };
        let mut out = vec![NEUTRAL_SCORE; self.values.len()];
        for d in 0..n_dates {
            let row = &self.values[d * n..(d + 1) * n];
            let z = stats::zscore(row);
            for t in 0..n {
                out[d * n + t] = stats::z_to_score(z[t], CLIP_Z);
            }
        }
        out
    }
}

/// Weighted blend of standardized sub-signals into one score panel.
///
/// Every part is already in [0, 100], so the blend is too as long as the
/// weights sum to 1.
pub(crate) fn blend_scores(template: &Panel, parts: &[(f64, RawSignal)]) -> Panel {
    let mut out = Panel::filled(
        template.dates().to_vec(),
        template.tickers().to_vec(),
        0.0,
    );
    let n = template.n_tickers();
    let standardized: Vec<Vec<f64>> = parts.iter().map(|(_, s)| s.standardize()).collect();
    for d in 0..template.n_dates() {
        for t in 0..n {
            let mut acc = 0.0;
            for (k, (w, _)) in parts.iter().enumerate() {
                acc += w * standardized[k][d * n + t];
            }
            out.set(d, t, if acc.is_finite() { acc } else { NEUTRAL_SCORE });
        }
    }
    out
}

/// Per-ticker daily return columns for a price panel.
pub(crate) fn return_columns(prices: &Panel) -> Vec<Vec<f64>> {
    let rets = prices.pct_change(1);
    (0..prices.n_tickers()).map(|t| rets.column(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn panel(n_dates: usize, cols: &[(&str, f64)]) -> Panel {
        let dates: Vec<NaiveDate> = (0..n_dates)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        let tickers: Vec<String> = cols.iter().map(|(t, _)| t.to_string()).collect();
        let mut values = Vec::new();
        for _ in 0..n_dates {
            for (_, v) in cols {
                values.push(*v);
            }
        }
        Panel::new(dates, tickers, values).unwrap()
    }

    #[test]
    fn standardize_maps_nan_to_neutral() {
        let raw = RawSignal {
            values: vec![1.0, f64::NAN, 3.0],
            n_tickers: 3,
        };
        let s = raw.standardize();
        assert_eq!(s[1], NEUTRAL_SCORE);
        assert!(s[0] < NEUTRAL_SCORE && s[2] > NEUTRAL_SCORE);
    }

    #[test]
    fn standardize_flat_cross_section_is_neutral() {
        let raw = RawSignal {
            values: vec![7.0, 7.0, 7.0],
            n_tickers: 3,
        };
        assert!(raw.standardize().iter().all(|&v| v == NEUTRAL_SCORE));
    }

    #[test]
    fn blend_stays_in_score_range() {
        let template = panel(2, &[("AAA", 1.0), ("BBB", 2.0)]);
        let a = RawSignal {
            values: vec![1.0, 9.0, 2.0, 8.0],
            n_tickers: 2,
        };
        let b = RawSignal {
            values: vec![f64::NAN, f64::NAN, f64::NAN, f64::NAN],
            n_tickers: 2,
        };
        let blended = blend_scores(&template, &[(0.6, a), (0.4, b)]);
        for d in 0..2 {
            for t in 0..2 {
                let v = blended.get(d, t);
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}
