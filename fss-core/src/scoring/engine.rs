//! The scoring engine: factor panels in, per-ticker score results out.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{Confidence, FactorWeights, ScoringConfig};
use crate::domain::{Panel, Series};
use crate::factors::{
    Factor, FactorInputs, FundamentalFactor, FundamentalsBundle, NEUTRAL_SCORE,
};
use crate::regime::{Regime, RegimeResult};
use crate::safety::{BalanceSheetInputs, SafetyFilter};
use crate::scoring::{forward_returns, regime_robustness, signal_stability};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("price panel is empty")]
    EmptyPanel,
    #[error("volume panel shape does not match price panel")]
    VolumeShapeMismatch,
}

/// Everything the engine consumes for one scoring call. All borrowed; the
/// engine never mutates or retains inputs.
#[derive(Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub prices: &'a Panel,
    pub volumes: &'a Panel,
    pub benchmark: &'a Series,
    pub vol_index: Option<&'a Series>,
    pub fundamentals: Option<&'a FundamentalsBundle>,
    pub balance_sheets: Option<&'a HashMap<String, BalanceSheetInputs>>,
    pub earnings_quality: Option<&'a HashMap<String, f64>>,
}

/// Full panel output of one scoring call: the blended score plus the four
/// component panels it was built from.
#[derive(Debug, Clone)]
pub struct FssPanels {
    pub fss: Panel,
    pub trend: Panel,
    pub fundamental: Panel,
    pub capital_flow: Panel,
    pub risk: Panel,
    pub regime: RegimeResult,
    pub weights: FactorWeights,
}

/// Per-ticker scoring outcome for the latest date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub ticker: String,
    pub fss_score: f64,
    pub trend_score: f64,
    pub fundamental_score: f64,
    pub capital_flow_score: f64,
    pub risk_score: f64,
    pub confidence: Confidence,
    pub regime: Regime,
    pub passed_safety_filters: bool,
    pub safety_reason: String,
    /// None when diagnostics are disabled or the ticker is unknown.
    pub regime_robustness: Option<f64>,
    pub signal_stability: Option<f64>,
}

impl ScoreResult {
    fn not_found(ticker: &str, regime: Regime) -> Self {
        Self {
            ticker: ticker.to_string(),
            fss_score: 0.0,
            trend_score: 0.0,
            fundamental_score: 0.0,
            capital_flow_score: 0.0,
            risk_score: 0.0,
            confidence: Confidence::Low,
            regime,
            passed_safety_filters: false,
            safety_reason: "Ticker not found".to_string(),
            regime_robustness: None,
            signal_stability: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    pub config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Compute the four factor panels and blend them into the score panel.
    pub fn compute_panels(&self, inputs: &ScoringInputs) -> Result<FssPanels, ScoringError> {
        let prices = inputs.prices;
        if prices.is_empty() {
            return Err(ScoringError::EmptyPanel);
        }
        if inputs.volumes.n_dates() != prices.n_dates()
            || inputs.volumes.tickers() != prices.tickers()
        {
            return Err(ScoringError::VolumeShapeMismatch);
        }

        let regime = self.config.regime.detect(inputs.benchmark, inputs.vol_index);
        let factor_inputs = FactorInputs {
            prices,
            volumes: inputs.volumes,
            benchmark: inputs.benchmark,
            fundamentals: inputs.fundamentals,
        };

        let trend = self.config.trend.compute(&factor_inputs);
        let fundamental = FundamentalFactor.compute(&factor_inputs);
        let capital_flow = self.config.capital_flow.compute(&factor_inputs);
        let risk = self.config.risk.compute(&factor_inputs);

        let mut weights = match self.config.weight_override {
            Some(w) => w,
            None if self.config.use_regime_weighting => {
                self.config.regime_weights.get(regime.regime)
            }
            None => FactorWeights::default(),
        };
        if panel_is_neutral(&fundamental) {
            weights = weights.without_fundamental();
        }
        debug!(
            regime = %regime.regime,
            trend_w = weights.trend,
            fundamental_w = weights.fundamental,
            "scoring with regime weights"
        );

        let mut fss = Panel::filled(
            prices.dates().to_vec(),
            prices.tickers().to_vec(),
            NEUTRAL_SCORE,
        );
        for d in 0..prices.n_dates() {
            for t in 0..prices.n_tickers() {
                let (tv, fv, cv, rv) = (
                    trend.get(d, t),
                    fundamental.get(d, t),
                    capital_flow.get(d, t),
                    risk.get(d, t),
                );
                let base = weights.trend * tv
                    + weights.fundamental * fv
                    + weights.capital_flow * cv
                    + weights.risk * rv;
                fss.set(d, t, apply_interactions(base, tv, fv, cv).clamp(0.0, 100.0));
            }
        }

        Ok(FssPanels {
            fss,
            trend,
            fundamental,
            capital_flow,
            risk,
            regime,
            weights,
        })
    }

    /// Score every requested ticker from the latest date of the panels.
    ///
    /// Unknown tickers come back as zero-score "not found" results instead
    /// of failing the batch.
    pub fn score_universe(
        &self,
        inputs: &ScoringInputs,
        tickers: &[String],
    ) -> Result<Vec<ScoreResult>, ScoringError> {
        let panels = self.compute_panels(inputs)?;
        let regime_labels = if self.config.compute_diagnostics {
            Some(
                self.config
                    .regime
                    .label_series(inputs.benchmark, inputs.vol_index),
            )
        } else {
            None
        };
        let safety = SafetyFilter::new(self.config.safety.clone());

        let results = tickers
            .par_iter()
            .map(|ticker| self.score_ticker(ticker, inputs, &panels, &safety, regime_labels.as_deref()))
            .collect();
        Ok(results)
    }

    fn score_ticker(
        &self,
        ticker: &str,
        inputs: &ScoringInputs,
        panels: &FssPanels,
        safety: &SafetyFilter,
        regime_labels: Option<&[Regime]>,
    ) -> ScoreResult {
        let Some(t) = inputs.prices.ticker_index(ticker) else {
            return ScoreResult::not_found(ticker, panels.regime.regime);
        };

        let last = panels.fss.n_dates() - 1;
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        let trend_score = finite(panels.trend.get(last, t));
        let fundamental_score = finite(panels.fundamental.get(last, t));
        let capital_flow_score = finite(panels.capital_flow.get(last, t));
        let risk_score = finite(panels.risk.get(last, t));

        let verdict = safety.check(
            ticker,
            inputs.volumes,
            inputs.balance_sheets.and_then(|m| m.get(ticker)),
            inputs.earnings_quality.and_then(|m| m.get(ticker)).copied(),
        );

        let (robustness, stability) = match regime_labels {
            Some(labels) if labels.len() == panels.fss.n_dates() => {
                let scores = panels.fss.column(t);
                let fwd = forward_returns(&inputs.prices.column(t), self.config.forward_horizon);
                (
                    Some(regime_robustness(&scores, &fwd, labels)),
                    Some(signal_stability(&scores, &fwd)),
                )
            }
            _ => (None, None),
        };

        ScoreResult {
            ticker: ticker.to_string(),
            fss_score: finite(panels.fss.get(last, t)),
            trend_score,
            fundamental_score,
            capital_flow_score,
            risk_score,
            confidence: Confidence::from_components(
                trend_score,
                fundamental_score,
                capital_flow_score,
                risk_score,
            ),
            regime: panels.regime.regime,
            passed_safety_filters: verdict.passed,
            safety_reason: verdict.reason,
            regime_robustness: robustness,
            signal_stability: stability,
        }
    }
}

/// Distribution penalty, fundamental floor, synergy boost.
fn apply_interactions(base: f64, trend: f64, fundamental: f64, capital_flow: f64) -> f64 {
    let mut v = base;
    if trend > 70.0 && capital_flow < 40.0 {
        v *= 0.85;
    }
    if fundamental < 25.0 {
        v *= 0.50;
    }
    if trend > 70.0 && fundamental > 70.0 {
        v *= 1.15;
    }
    v
}

fn panel_is_neutral(panel: &Panel) -> bool {
    (0..panel.n_dates()).all(|d| {
        panel
            .row(d)
            .iter()
            .all(|&v| (v - NEUTRAL_SCORE).abs() < 1e-9)
    })
}
