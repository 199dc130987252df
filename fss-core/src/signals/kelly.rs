//! Kelly-Criterion position sizing from a historical return series.

use serde::{Deserialize, Serialize};

use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyConfig {
    /// Returns above this count as wins.
    pub win_threshold: f64,
    /// Fraction of full Kelly actually recommended (quarter-Kelly).
    pub conservative_multiplier: f64,
    /// Minimum return observations before sizing anything.
    pub min_observations: usize,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            win_threshold: 0.0,
            conservative_multiplier: 0.25,
            min_observations: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyResult {
    pub ticker: String,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Full Kelly fraction, clipped to [0,1].
    pub kelly_fraction: f64,
    /// Quarter-Kelly recommendation.
    pub recommended_fraction: f64,
    /// Two-sigma drawdown estimate at the recommended size.
    pub max_drawdown_risk: f64,
}

impl KellyConfig {
    pub fn compute(&self, ticker: &str, returns: &[f64]) -> KellyResult {
        let valid: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        if valid.len() < self.min_observations {
            return KellyResult {
                ticker: ticker.to_string(),
                win_rate: 0.5,
                avg_win: 0.0,
                avg_loss: 0.0,
                kelly_fraction: 0.0,
                recommended_fraction: 0.0,
                max_drawdown_risk: 0.0,
            };
        }

        let wins: Vec<f64> = valid
            .iter()
            .copied()
            .filter(|&r| r > self.win_threshold)
            .collect();
        let losses: Vec<f64> = valid
            .iter()
            .copied()
            .filter(|&r| r <= self.win_threshold)
            .collect();

        let win_rate = wins.len() as f64 / valid.len() as f64;
        // All-win or all-loss histories fall back to a 2:1 payoff prior.
        let avg_win = if wins.is_empty() {
            0.02
        } else {
            stats::mean(&wins)
        };
        let avg_loss = if losses.is_empty() {
            0.01
        } else {
            stats::mean(&losses).abs()
        };

        let kelly_fraction = if avg_loss > 0.0 {
            let b = avg_win / avg_loss;
            ((win_rate * b - (1.0 - win_rate)) / b).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let recommended_fraction = kelly_fraction * self.conservative_multiplier;
        let max_drawdown_risk = recommended_fraction * stats::std_pop(&valid) * 2.0;

        KellyResult {
            ticker: ticker.to_string(),
            win_rate,
            avg_win,
            avg_loss,
            kelly_fraction,
            recommended_fraction,
            max_drawdown_risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_is_neutral() {
        let r = KellyConfig::default().compute("X", &[0.01; 10]);
        assert_eq!(r.win_rate, 0.5);
        assert_eq!(r.kelly_fraction, 0.0);
        assert_eq!(r.recommended_fraction, 0.0);
    }

    #[test]
    fn favorable_odds_size_positive() {
        // 60% wins of +2%, 40% losses of -1%: f = (0.6*2 - 0.4)/2 = 0.4.
        let mut returns = Vec::new();
        for _ in 0..60 {
            returns.push(0.02);
        }
        for _ in 0..40 {
            returns.push(-0.01);
        }
        let r = KellyConfig::default().compute("GOOD", &returns);
        assert!((r.win_rate - 0.6).abs() < 1e-12);
        assert!((r.kelly_fraction - 0.4).abs() < 1e-9);
        assert!((r.recommended_fraction - 0.1).abs() < 1e-9);
        assert!(r.max_drawdown_risk > 0.0);
    }

    #[test]
    fn losing_odds_size_zero() {
        let mut returns = Vec::new();
        for _ in 0..30 {
            returns.push(0.01);
        }
        for _ in 0..70 {
            returns.push(-0.02);
        }
        let r = KellyConfig::default().compute("BAD", &returns);
        assert_eq!(r.kelly_fraction, 0.0);
        assert_eq!(r.recommended_fraction, 0.0);
    }

    #[test]
    fn kelly_never_exceeds_one() {
        let r = KellyConfig::default().compute("SURE", &[0.05; 50]);
        assert!(r.kelly_fraction <= 1.0);
        assert!((r.win_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nan_returns_are_ignored() {
        let mut returns = vec![f64::NAN; 5];
        for _ in 0..60 {
            returns.push(0.02);
        }
        for _ in 0..40 {
            returns.push(-0.01);
        }
        let r = KellyConfig::default().compute("MIXED", &returns);
        assert!((r.win_rate - 0.6).abs() < 1e-12);
    }
}
