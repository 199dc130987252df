//! Mean-reversion signal from Bollinger-band deviations.
//!
//! The reversion probability is empirical, not parametric: the history is
//! scanned for past dates whose band deviation matched today's, and the
//! probability is the fraction of those that pulled back toward the mean
//! within the horizon.

use serde::{Deserialize, Serialize};

use crate::scoring::Confidence;
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionConfig {
    /// Rolling window for the band mean and standard deviation.
    pub window: usize,
    /// Band width in standard deviations.
    pub num_std: f64,
    /// Horizon (periods) within which reversion must occur.
    pub horizon: usize,
    /// Relative tolerance for matching a past deviation to today's.
    pub match_tolerance: f64,
    /// A match counts as reverted when its deviation shrank to below this
    /// fraction of the original.
    pub reversion_shrink: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            window: 20,
            num_std: 2.0,
            horizon: 10,
            match_tolerance: 0.2,
            reversion_shrink: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionSignal {
    pub ticker: String,
    pub current_price: f64,
    pub mean_price: f64,
    /// Signed deviation from the rolling mean, in standard deviations.
    pub deviation_sigma: f64,
    /// Empirical probability of reversion within the horizon, in [0,1].
    pub reversion_probability: f64,
    /// Average historical peak-to-trough drop after similar deviations.
    pub expected_drawdown: f64,
    pub horizon: usize,
    pub confidence: Confidence,
}

impl MeanReversionConfig {
    pub fn compute(&self, ticker: &str, prices: &[f64]) -> MeanReversionSignal {
        let n = prices.len();
        if n < self.window {
            return MeanReversionSignal {
                ticker: ticker.to_string(),
                current_price: prices.last().copied().unwrap_or(0.0),
                mean_price: 0.0,
                deviation_sigma: 0.0,
                reversion_probability: 0.5,
                expected_drawdown: 0.0,
                horizon: self.horizon,
                confidence: Confidence::Low,
            };
        }

        let window = &prices[n - self.window..];
        let mean_price = stats::mean(window);
        let std_price = stats::std_pop(window);
        let current_price = prices[n - 1];
        let deviation_sigma = if std_price > 0.0 {
            (current_price - mean_price) / std_price
        } else {
            0.0
        };

        let reversion_probability = self.reversion_probability(prices, deviation_sigma.abs());
        let expected_drawdown = self.expected_drawdown(prices, deviation_sigma.abs());

        let confidence = if deviation_sigma.abs() >= self.num_std && reversion_probability > 0.65
        {
            Confidence::High
        } else if deviation_sigma.abs() >= self.num_std * 0.75 && reversion_probability > 0.55 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        MeanReversionSignal {
            ticker: ticker.to_string(),
            current_price,
            mean_price,
            deviation_sigma,
            reversion_probability,
            expected_drawdown,
            horizon: self.horizon,
            confidence,
        }
    }

    /// Fraction of comparable past deviations that shrank within the horizon.
    fn reversion_probability(&self, prices: &[f64], current_sigma: f64) -> f64 {
        let n = prices.len();
        if n < self.window + self.horizon {
            return 0.5;
        }

        let mut reverted = 0usize;
        let mut matched = 0usize;
        for i in self.window..n - self.horizon {
            let window = &prices[i - self.window..i];
            let mean = stats::mean(window);
            let std = stats::std_pop(window);
            if std <= 0.0 {
                continue;
            }
            let sigma_at_i = ((prices[i] - mean) / std).abs();
            if (sigma_at_i - current_sigma).abs() / current_sigma.max(0.1) > self.match_tolerance
            {
                continue;
            }
            matched += 1;
            // Re-measure against the same band so the comparison is apples
            // to apples.
            let future_sigma = ((prices[i + self.horizon - 1] - mean) / std).abs();
            if future_sigma < sigma_at_i * self.reversion_shrink {
                reverted += 1;
            }
        }

        if matched > 0 {
            reverted as f64 / matched as f64
        } else {
            0.5
        }
    }

    /// Mean peak-to-trough drop over the 20 periods following comparable
    /// deviations. Defaults to 5% when no history qualifies.
    fn expected_drawdown(&self, prices: &[f64], sigma_threshold: f64) -> f64 {
        const FORWARD: usize = 20;
        let n = prices.len();
        if n < self.window + FORWARD {
            return 0.05;
        }

        let mut drawdowns = Vec::new();
        for i in self.window..n - FORWARD {
            let window = &prices[i - self.window..i];
            let mean = stats::mean(window);
            let std = stats::std_pop(window);
            if std <= 0.0 {
                continue;
            }
            let sigma = ((prices[i] - mean) / std).abs();
            if sigma >= sigma_threshold * 0.8 {
                let future = &prices[i..i + FORWARD];
                let peak = future.iter().copied().fold(f64::MIN, f64::max);
                let trough = future.iter().copied().fold(f64::MAX, f64::min);
                if peak > 0.0 {
                    drawdowns.push((peak - trough) / peak);
                }
            }
        }

        if drawdowns.is_empty() {
            0.05
        } else {
            stats::mean(&drawdowns)
        }
    }
}
