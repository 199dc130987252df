//! Fundamental factor — EPS acceleration, revenue growth, margin trend.
//!
//! F = 0.45 · EPS acceleration + 0.35 · revenue YoY + 0.20 · margin trend.
//! Absence of the fundamentals bundle (or of any required metric) emits a
//! fully neutral panel; the scoring engine then redistributes this factor's
//! weight across the remaining three.

use serde::{Deserialize, Serialize};

use super::{
    blend_scores, Factor, FactorInputs, FundamentalsBundle, RawSignal, NEUTRAL_SCORE,
};
use crate::domain::Panel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalFactor;

impl FundamentalFactor {
    fn metric_columns(panel: &Panel, template: &Panel) -> Option<Vec<Vec<f64>>> {
        // Metric panels must share the template's shape; a mismatched panel
        // is treated as missing rather than partially applied.
        if panel.n_dates() != template.n_dates() || panel.tickers() != template.tickers() {
            return None;
        }
        Some((0..panel.n_tickers()).map(|t| panel.column(t)).collect())
    }
}

impl Factor for FundamentalFactor {
    fn name(&self) -> &'static str {
        "fundamental"
    }

    fn compute(&self, inputs: &FactorInputs) -> Panel {
        let prices = inputs.prices;
        let neutral = || {
            Panel::filled(
                prices.dates().to_vec(),
                prices.tickers().to_vec(),
                NEUTRAL_SCORE,
            )
        };

        let Some(bundle) = inputs.fundamentals else {
            return neutral();
        };
        let (Some(eps), Some(rev), Some(margin)) = (
            bundle.get(FundamentalsBundle::EPS_ACCELERATION),
            bundle.get(FundamentalsBundle::REVENUE_YOY),
            bundle.get(FundamentalsBundle::MARGIN_TREND),
        ) else {
            return neutral();
        };
        let (Some(eps_cols), Some(rev_cols), Some(margin_cols)) = (
            Self::metric_columns(eps, prices),
            Self::metric_columns(rev, prices),
            Self::metric_columns(margin, prices),
        ) else {
            return neutral();
        };

        let n_dates = prices.n_dates();
        blend_scores(
            prices,
            &[
                (0.45, RawSignal::from_columns(eps_cols, n_dates)),
                (0.35, RawSignal::from_columns(rev_cols, n_dates)),
                (0.20, RawSignal::from_columns(margin_cols, n_dates)),
            ],
        )
    }
}
