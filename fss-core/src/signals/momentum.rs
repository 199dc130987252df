//! Multi-timeframe momentum signal with persistence and decay estimates.

use serde::{Deserialize, Serialize};

use super::simple_returns;
use crate::scoring::Confidence;
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Short momentum lookback (~1 month of trading days).
    pub daily_period: usize,
    /// Medium lookback (~3 months).
    pub weekly_period: usize,
    /// Long lookback (~6 months).
    pub monthly_period: usize,
    /// Confidence weights for the three timeframes, longest weighted most.
    pub daily_weight: f64,
    pub weekly_weight: f64,
    pub monthly_weight: f64,
    /// Horizon for the momentum-decay estimate.
    pub decay_horizon: usize,
    /// Half-life above this many periods earns the persistence boost.
    pub persistence_threshold: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            daily_period: 21,
            weekly_period: 63,
            monthly_period: 126,
            daily_weight: 0.2,
            weekly_weight: 0.3,
            monthly_weight: 0.5,
            decay_horizon: 7,
            persistence_threshold: 18.0,
        }
    }
}

/// Sign of momentum per timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumAlignment {
    pub daily: bool,
    pub weekly: bool,
    pub monthly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumSignal {
    pub ticker: String,
    pub current_price: f64,
    pub alignment: MomentumAlignment,
    /// Ticker momentum relative to benchmark momentum, when computable.
    pub relative_strength: Option<f64>,
    /// Periods until momentum decays by half, from lag-1 autocorrelation.
    pub half_life: f64,
    /// Probability that positive momentum reverses within the decay horizon.
    pub decay_probability: f64,
    /// Weighted alignment confidence in [0,1], after boosts.
    pub timing_confidence: f64,
    pub confidence: Confidence,
}

impl MomentumConfig {
    pub fn compute(
        &self,
        ticker: &str,
        prices: &[f64],
        benchmark: Option<&[f64]>,
    ) -> MomentumSignal {
        let n = prices.len();
        if n < self.monthly_period {
            return MomentumSignal {
                ticker: ticker.to_string(),
                current_price: prices.last().copied().unwrap_or(0.0),
                alignment: MomentumAlignment {
                    daily: false,
                    weekly: false,
                    monthly: false,
                },
                relative_strength: None,
                half_life: 0.0,
                decay_probability: 0.5,
                timing_confidence: 0.5,
                confidence: Confidence::Low,
            };
        }

        let daily_mom = trailing_momentum(prices, self.daily_period);
        let weekly_mom = trailing_momentum(prices, self.weekly_period);
        let monthly_mom = trailing_momentum(prices, self.monthly_period);
        let alignment = MomentumAlignment {
            daily: daily_mom > 0.0,
            weekly: weekly_mom > 0.0,
            monthly: monthly_mom > 0.0,
        };

        let relative_strength = benchmark
            .filter(|b| b.len() >= self.monthly_period)
            .map(|b| trailing_momentum(b, self.monthly_period))
            .filter(|&m| m != 0.0)
            .map(|bench_mom| {
                if bench_mom.abs() > 0.01 {
                    monthly_mom / bench_mom.abs()
                } else {
                    1.0
                }
            });

        let half_life = self.trend_persistence_half_life(prices);
        let decay_probability = self.momentum_decay_probability(prices);

        let mut timing_confidence = 0.0;
        if alignment.daily {
            timing_confidence += self.daily_weight;
        }
        if alignment.weekly {
            timing_confidence += self.weekly_weight;
        }
        if alignment.monthly {
            timing_confidence += self.monthly_weight;
        }
        if relative_strength.is_some_and(|rs| rs > 1.0) {
            timing_confidence = (timing_confidence * 1.15).min(1.0);
        }
        if half_life > self.persistence_threshold {
            timing_confidence = (timing_confidence * 1.2).min(1.0);
        }

        let confidence = if timing_confidence >= 0.75 && decay_probability < 0.25 {
            Confidence::High
        } else if timing_confidence >= 0.5 && decay_probability < 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        MomentumSignal {
            ticker: ticker.to_string(),
            current_price: prices[n - 1],
            alignment,
            relative_strength,
            half_life,
            decay_probability,
            timing_confidence,
            confidence,
        }
    }

    /// Half-life from lag-1 return autocorrelation, capped at 60 periods.
    /// Non-positive autocorrelation falls back to a 10-period default.
    fn trend_persistence_half_life(&self, prices: &[f64]) -> f64 {
        if prices.len() < 60 {
            return 10.0;
        }
        let returns = simple_returns(prices);
        if returns.len() < 30 {
            return 10.0;
        }
        let ac = stats::autocorrelation(&returns, 1);
        if ac > 0.0 {
            let half_life = -(0.5f64.ln()) / ac.max(0.01).ln();
            half_life.min(60.0)
        } else {
            10.0
        }
    }

    /// Fraction of past positive trailing momentum readings that reversed
    /// within the decay horizon.
    fn momentum_decay_probability(&self, prices: &[f64]) -> f64 {
        let n = prices.len();
        if n < 30 || n <= self.daily_period + self.decay_horizon {
            return 0.5;
        }

        let mut positive = 0usize;
        let mut reversed = 0usize;
        for i in self.daily_period..n - self.decay_horizon {
            let base = prices[i - self.daily_period];
            let now = prices[i];
            let future = prices[i + self.decay_horizon];
            if !base.is_finite() || !now.is_finite() || !future.is_finite() || base == 0.0 {
                continue;
            }
            if now / base - 1.0 > 0.0 {
                positive += 1;
                if now != 0.0 && future / now - 1.0 < 0.0 {
                    reversed += 1;
                }
            }
        }

        if positive > 0 {
            reversed as f64 / positive as f64
        } else {
            0.5
        }
    }
}

fn trailing_momentum(prices: &[f64], periods: usize) -> f64 {
    let n = prices.len();
    if n < periods {
        return 0.0;
    }
    let base = prices[n - periods];
    if !base.is_finite() || base == 0.0 {
        return 0.0;
    }
    prices[n - 1] / base - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize, drift: f64) -> Vec<f64> {
        (0..n).map(|i| 100.0 * (1.0 + drift).powi(i as i32)).collect()
    }

    #[test]
    fn short_history_is_neutral() {
        let sig = MomentumConfig::default().compute("X", &trending(50, 0.002), None);
        assert_eq!(sig.timing_confidence, 0.5);
        assert_eq!(sig.confidence, Confidence::Low);
        assert!(!sig.alignment.monthly);
    }

    #[test]
    fn steady_uptrend_aligns_all_timeframes() {
        let prices = trending(200, 0.002);
        let flat = vec![100.0; 200];
        let sig = MomentumConfig::default().compute("UP", &prices, Some(&flat));
        assert!(sig.alignment.daily && sig.alignment.weekly && sig.alignment.monthly);
        // A monotone uptrend never reverses, so decay probability is zero
        // and the full alignment weight survives.
        assert_eq!(sig.decay_probability, 0.0);
        assert!(sig.timing_confidence >= 1.0 - 1e-12);
        assert_eq!(sig.confidence, Confidence::High);
    }

    #[test]
    fn downtrend_has_no_alignment() {
        let sig = MomentumConfig::default().compute("DN", &trending(200, -0.002), None);
        assert!(!sig.alignment.daily && !sig.alignment.weekly && !sig.alignment.monthly);
        assert_eq!(sig.timing_confidence, 0.0);
        assert_eq!(sig.confidence, Confidence::Low);
    }

    #[test]
    fn relative_strength_vs_flat_benchmark_is_unit_scaled() {
        // Flat benchmark momentum is 0, so relative strength is undefined.
        let prices = trending(200, 0.002);
        let flat = vec![100.0; 200];
        let sig = MomentumConfig::default().compute("UP", &prices, Some(&flat));
        assert!(sig.relative_strength.is_none());
    }

    #[test]
    fn outperformer_earns_relative_strength_boost() {
        let prices = trending(200, 0.004);
        let bench = trending(200, 0.001);
        let sig = MomentumConfig::default().compute("UP", &prices, Some(&bench));
        let rs = sig.relative_strength.unwrap();
        assert!(rs > 1.0, "relative strength {rs} should exceed 1");
    }

    #[test]
    fn half_life_caps_at_60() {
        // Constant compounding gives near-perfectly autocorrelated returns.
        let sig = MomentumConfig::default().compute("UP", &trending(200, 0.002), None);
        assert!(sig.half_life <= 60.0);
        assert!(sig.half_life > 0.0);
    }
}
