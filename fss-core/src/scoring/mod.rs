//! Future Success Score: regime-weighted factor blend with interaction
//! adjustments, plus robustness diagnostics derived from score history.

mod engine;
mod robustness;
mod stability;

pub use engine::{FssPanels, ScoreResult, ScoringEngine, ScoringError, ScoringInputs};
pub use robustness::{forward_returns, regime_robustness};
pub use stability::signal_stability;

use serde::{Deserialize, Serialize};

use crate::factors::{CapitalFlowFactor, RiskFactor, TrendFactor};
use crate::regime::{Regime, RegimeDetector};
use crate::safety::SafetyConfig;

// ─── Weights ─────────────────────────────────────────────────────────────────

/// Per-factor blend weights. Expected to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub trend: f64,
    pub fundamental: f64,
    pub capital_flow: f64,
    pub risk: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            trend: 0.30,
            fundamental: 0.30,
            capital_flow: 0.25,
            risk: 0.15,
        }
    }
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.trend + self.fundamental + self.capital_flow + self.risk
    }

    /// Drop the fundamental weight and renormalize the remaining three.
    ///
    /// Used when the fundamental panel is entirely neutral, so a missing
    /// bundle does not drag every score toward 50.
    pub fn without_fundamental(&self) -> FactorWeights {
        let rest = self.trend + self.capital_flow + self.risk;
        if rest <= 0.0 {
            return *self;
        }
        FactorWeights {
            trend: self.trend / rest,
            fundamental: 0.0,
            capital_flow: self.capital_flow / rest,
            risk: self.risk / rest,
        }
    }
}

/// Regime-specific weight overrides. Crisis collapses almost entirely onto
/// the risk factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeWeightTable {
    pub expansion: FactorWeights,
    pub parabolic: FactorWeights,
    pub deflation: FactorWeights,
    pub crisis: FactorWeights,
}

impl Default for RegimeWeightTable {
    fn default() -> Self {
        Self {
            expansion: FactorWeights {
                trend: 0.25,
                fundamental: 0.40,
                capital_flow: 0.20,
                risk: 0.15,
            },
            parabolic: FactorWeights {
                trend: 0.45,
                fundamental: 0.15,
                capital_flow: 0.30,
                risk: 0.10,
            },
            deflation: FactorWeights {
                trend: 0.20,
                fundamental: 0.30,
                capital_flow: 0.15,
                risk: 0.35,
            },
            crisis: FactorWeights {
                trend: 0.10,
                fundamental: 0.10,
                capital_flow: 0.10,
                risk: 0.70,
            },
        }
    }
}

impl RegimeWeightTable {
    pub fn get(&self, regime: Regime) -> FactorWeights {
        match regime {
            Regime::Expansion => self.expansion,
            Regime::Parabolic => self.parabolic,
            Regime::Deflation => self.deflation,
            Regime::Crisis => self.crisis,
        }
    }
}

// ─── Confidence ──────────────────────────────────────────────────────────────

/// Component-confluence confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// High when at least three components agree on an extreme side,
    /// medium when two do, low otherwise.
    pub fn from_components(t: f64, f: f64, c: f64, r: f64) -> Confidence {
        let scores = [t, f, c, r];
        let above = scores.iter().filter(|&&s| s > 60.0).count();
        let below = scores.iter().filter(|&&s| s < 40.0).count();
        if above >= 3 || below >= 3 {
            Confidence::High
        } else if above >= 2 || below >= 2 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Fixed weights overriding both defaults and the regime table.
    pub weight_override: Option<FactorWeights>,
    pub regime_weights: RegimeWeightTable,
    /// When false the default weights apply in every regime.
    pub use_regime_weighting: bool,
    pub trend: TrendFactor,
    pub capital_flow: CapitalFlowFactor,
    pub risk: RiskFactor,
    pub regime: RegimeDetector,
    pub safety: SafetyConfig,
    /// Forward-return horizon for the robustness diagnostics, in periods.
    pub forward_horizon: usize,
    /// Skip the robustness and stability diagnostics when false.
    pub compute_diagnostics: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_override: None,
            regime_weights: RegimeWeightTable::default(),
            use_regime_weighting: true,
            trend: TrendFactor::default(),
            capital_flow: CapitalFlowFactor::default(),
            risk: RiskFactor::default(),
            regime: RegimeDetector::default(),
            safety: SafetyConfig::default(),
            forward_horizon: 21,
            compute_diagnostics: true,
        }
    }
}
