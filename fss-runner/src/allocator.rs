//! Correlation-aware portfolio allocation.
//!
//! Three interchangeable strategies over the same inputs (per-ticker Kelly
//! fraction, score, robustness, volatility, plus the pairwise correlation
//! matrix). All of them normalize, clip to the configured weight band, and
//! renormalize, so individual Kelly sizing can never concentrate the book
//! into a cluster of correlated names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fss_core::domain::Panel;
use fss_core::stats;

use crate::correlation::CorrelationMatrix;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    KellyConstrained,
    RiskParity,
    MeanVariance,
}

impl AllocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMethod::KellyConstrained => "kelly_constrained",
            AllocationMethod::RiskParity => "risk_parity",
            AllocationMethod::MeanVariance => "mean_variance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Weight band per position.
    pub max_position_size: f64,
    pub min_position_size: f64,
    /// Pairwise correlation above this starts drawing a penalty.
    pub target_correlation: f64,
    /// Annual risk-free rate for the Sharpe estimate.
    pub risk_free_rate: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_position_size: 0.15,
            min_position_size: 0.01,
            target_correlation: 0.3,
            risk_free_rate: 0.04,
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.min_position_size < 0.0
            || self.max_position_size > 1.0
            || self.min_position_size >= self.max_position_size
        {
            return Err(AllocationError::InvalidBounds {
                min: self.min_position_size,
                max: self.max_position_size,
            });
        }
        if !(0.0..1.0).contains(&self.target_correlation) {
            return Err(AllocationError::InvalidCorrelationTarget(
                self.target_correlation,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("no tickers supplied for allocation")]
    EmptyUniverse,
    #[error("invalid position bounds: min {min} must be below max {max} within [0,1]")]
    InvalidBounds { min: f64, max: f64 },
    #[error("correlation target {0} must be in [0,1)")]
    InvalidCorrelationTarget(f64),
    #[error("ticker {0} missing from the returns panel")]
    UnknownTicker(String),
}

// ─── Inputs and result ───────────────────────────────────────────────

/// Everything the allocator needs to know about one candidate position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerInputs {
    pub ticker: String,
    /// Full Kelly fraction in [0,1].
    pub kelly_fraction: f64,
    /// FSS score in [0,100].
    pub fss_score: f64,
    /// Regime robustness in [0,1].
    pub robustness: f64,
    /// Annualized volatility.
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub weights: BTreeMap<String, f64>,
    /// Annualized, from historical mean returns.
    pub expected_return: f64,
    pub expected_volatility: f64,
    pub sharpe_ratio: f64,
    /// Rough 2.5-sigma estimate.
    pub max_drawdown_estimate: f64,
    /// 1 − mean |pairwise correlation|, in [0,1].
    pub diversification_score: f64,
    pub method: AllocationMethod,
    pub warnings: Vec<String>,
}

// ─── Allocator ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PortfolioAllocator {
    pub config: AllocatorConfig,
}

impl PortfolioAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// Allocate over the candidate set using historical returns for the
    /// correlation structure.
    ///
    /// Fewer than two candidates cannot be diversified: the result is an
    /// equal-weight book with a warning rather than an error, so batch
    /// pipelines keep moving.
    pub fn allocate(
        &self,
        inputs: &[TickerInputs],
        returns: &Panel,
        method: AllocationMethod,
    ) -> Result<AllocationResult, AllocationError> {
        self.config.validate()?;
        if inputs.is_empty() {
            return Err(AllocationError::EmptyUniverse);
        }
        for input in inputs {
            if returns.ticker_index(&input.ticker).is_none() {
                return Err(AllocationError::UnknownTicker(input.ticker.clone()));
            }
        }

        if inputs.len() < 2 {
            let mut weights = BTreeMap::new();
            weights.insert(inputs[0].ticker.clone(), 1.0);
            return Ok(AllocationResult {
                weights,
                expected_return: 0.0,
                expected_volatility: inputs[0].volatility,
                sharpe_ratio: 0.0,
                max_drawdown_estimate: inputs[0].volatility * 2.5,
                diversification_score: 0.0,
                method,
                warnings: vec!["Insufficient candidates for diversification".to_string()],
            });
        }

        let tickers: Vec<String> = inputs.iter().map(|i| i.ticker.clone()).collect();
        let corr = CorrelationMatrix::from_returns(returns)
            .select(&tickers)
            .expect("tickers verified against the returns panel above");

        let raw = match method {
            AllocationMethod::KellyConstrained => self.kelly_constrained(inputs, &corr),
            AllocationMethod::RiskParity => self.risk_parity(inputs, &corr),
            AllocationMethod::MeanVariance => self.mean_variance(inputs, &corr),
        };
        let weights = self.normalize_and_clip(raw);
        debug!(method = method.as_str(), n = inputs.len(), "allocated portfolio");

        Ok(self.with_diagnostics(inputs, weights, returns, &corr, method))
    }

    /// Kelly fractions scaled by robustness, then penalized by each ticker's
    /// worst pairwise correlation.
    fn kelly_constrained(&self, inputs: &[TickerInputs], corr: &CorrelationMatrix) -> Vec<f64> {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let base = input.kelly_fraction * (0.5 + input.robustness);
                base * self.worst_case_penalty(corr.max_abs_offdiag(i))
            })
            .collect()
    }

    /// Inverse volatility with a score tilt and robustness multiplier, with
    /// a softer correlation penalty off the average correlation.
    fn risk_parity(&self, inputs: &[TickerInputs], corr: &CorrelationMatrix) -> Vec<f64> {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let inv_vol = 1.0 / (input.volatility + 1e-12);
                let tilt = 0.5 + input.fss_score / 100.0;
                let robustness = 0.7 + 0.3 * input.robustness;
                let mut w = inv_vol * tilt * robustness;
                let avg_corr = corr.mean_abs_offdiag(i);
                if avg_corr > self.config.target_correlation {
                    let penalty = 1.0
                        - (avg_corr - self.config.target_correlation)
                            / (1.0 - self.config.target_correlation);
                    w *= penalty.max(0.3);
                }
                w
            })
            .collect()
    }

    /// Score-implied expected returns blended 50/50 between equal weight and
    /// a Sharpe-proportional tilt.
    fn mean_variance(&self, inputs: &[TickerInputs], _corr: &CorrelationMatrix) -> Vec<f64> {
        let n = inputs.len();
        // A score of 100 with full robustness implies a 20% annual return.
        let expected: Vec<f64> = inputs
            .iter()
            .map(|i| (i.fss_score / 100.0) * 0.20 * i.robustness)
            .collect();
        let sharpes: Vec<f64> = inputs
            .iter()
            .zip(expected.iter())
            .map(|(i, &er)| (er - self.config.risk_free_rate) / (i.volatility + 1e-12))
            .collect();
        let sharpe_sum: f64 = sharpes.iter().sum();
        let equal = 1.0 / n as f64;
        sharpes
            .iter()
            .map(|&s| 0.5 * equal + 0.5 * s / (sharpe_sum + 1e-12))
            .collect()
    }

    /// Penalty off the worst pairwise correlation: 1 at the target, shrinking
    /// to the 0.1 floor at perfect correlation, halved again above 0.8.
    fn worst_case_penalty(&self, max_corr: f64) -> f64 {
        if max_corr <= self.config.target_correlation {
            return 1.0;
        }
        let mut penalty = 1.0
            - (max_corr - self.config.target_correlation)
                / (1.0 - self.config.target_correlation);
        if max_corr > 0.8 {
            penalty *= 0.5;
        }
        penalty.max(0.1)
    }

    fn normalize_and_clip(&self, mut weights: Vec<f64>) -> Vec<f64> {
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        } else {
            let equal = 1.0 / weights.len() as f64;
            weights.fill(equal);
        }
        for w in &mut weights {
            *w = w.clamp(self.config.min_position_size, self.config.max_position_size);
        }
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        }
        weights
    }

    fn with_diagnostics(
        &self,
        inputs: &[TickerInputs],
        weights: Vec<f64>,
        returns: &Panel,
        corr: &CorrelationMatrix,
        method: AllocationMethod,
    ) -> AllocationResult {
        let n = inputs.len();

        // Annualized expected return from historical means.
        let expected_return: f64 = inputs
            .iter()
            .zip(weights.iter())
            .map(|(input, &w)| {
                let t = returns
                    .ticker_index(&input.ticker)
                    .expect("verified in allocate");
                let col: Vec<f64> = returns
                    .column(t)
                    .into_iter()
                    .filter(|v| v.is_finite())
                    .collect();
                w * stats::mean(&col) * 252.0
            })
            .sum();

        // Portfolio volatility from the vol/correlation covariance.
        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += weights[i]
                    * weights[j]
                    * inputs[i].volatility
                    * inputs[j].volatility
                    * corr.get(i, j);
            }
        }
        let expected_volatility = variance.max(0.0).sqrt();
        let sharpe_ratio =
            (expected_return - self.config.risk_free_rate) / (expected_volatility + 1e-12);
        let diversification_score = 1.0 - corr.mean_abs_pairwise();

        let mut warnings = Vec::new();
        if diversification_score < 0.3 {
            warnings.push(format!(
                "Low diversification (score {diversification_score:.2}), portfolio may be over-concentrated"
            ));
        }
        if expected_volatility > 0.30 {
            warnings.push(format!(
                "High portfolio volatility ({:.1}%)",
                expected_volatility * 100.0
            ));
        }
        if weights.iter().any(|&w| w > 0.20) {
            warnings.push("Large position size detected, consider reducing concentration".to_string());
        }

        AllocationResult {
            weights: inputs
                .iter()
                .map(|i| i.ticker.clone())
                .zip(weights)
                .collect(),
            expected_return,
            expected_volatility,
            sharpe_ratio,
            max_drawdown_estimate: expected_volatility * 2.5,
            diversification_score,
            method,
            warnings,
        }
    }
}
