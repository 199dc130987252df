//! Regime Robustness Score.
//!
//! Measures whether a score's predictive power (rank correlation with
//! forward returns) holds up across distinct market regimes, with a
//! small-sample shrinkage so thin regimes cannot dominate.

use std::collections::HashMap;

use crate::regime::Regime;
use crate::stats;

const MIN_SAMPLES_PER_REGIME: usize = 20;
const SHRINKAGE_SAMPLES: f64 = 20.0;
const FULL_CONFIDENCE_SAMPLES: f64 = 60.0;
const STRENGTH_SCALE: f64 = 0.08;
const CONSISTENCY_DECAY: f64 = 6.0;

/// `horizon`-period forward simple returns; the tail without a full horizon
/// is NaN.
pub fn forward_returns(prices: &[f64], horizon: usize) -> Vec<f64> {
    let n = prices.len();
    (0..n)
        .map(|i| {
            if i + horizon >= n {
                return f64::NAN;
            }
            let base = prices[i];
            let fwd = prices[i + horizon];
            if base.is_nan() || fwd.is_nan() || base == 0.0 {
                f64::NAN
            } else {
                fwd / base - 1.0
            }
        })
        .collect()
}

/// Robustness of the score's IC across regimes, in [0,1].
///
/// Returns 0.5 when the history never leaves a single regime (nothing to
/// compare), 0.0 when multiple regimes are present but fewer than two carry
/// enough samples or the mean shrunk IC is non-positive.
pub fn regime_robustness(scores: &[f64], fwd_returns: &[f64], regimes: &[Regime]) -> f64 {
    debug_assert_eq!(scores.len(), fwd_returns.len());
    debug_assert_eq!(scores.len(), regimes.len());

    let mut groups: HashMap<Regime, (Vec<f64>, Vec<f64>)> = HashMap::new();
    for i in 0..scores.len().min(fwd_returns.len()).min(regimes.len()) {
        if scores[i].is_finite() && fwd_returns[i].is_finite() {
            let entry = groups.entry(regimes[i]).or_default();
            entry.0.push(scores[i]);
            entry.1.push(fwd_returns[i]);
        }
    }

    if groups.len() <= 1 {
        return 0.5;
    }

    // Shrink each qualifying regime's IC toward zero by n/(n+20).
    let mut ics = Vec::new();
    let mut counts = Vec::new();
    for (s, r) in groups.values() {
        if s.len() >= MIN_SAMPLES_PER_REGIME {
            let n = s.len() as f64;
            ics.push(stats::spearman(s, r) * n / (n + SHRINKAGE_SAMPLES));
            counts.push(s.len());
        }
    }
    if ics.len() < 2 {
        return 0.0;
    }

    let mean_ic = stats::mean(&ics);
    if mean_ic <= 0.0 {
        return 0.0;
    }

    let strength = 1.0 - (-mean_ic.abs() / STRENGTH_SCALE).exp();
    let consistency = (-CONSISTENCY_DECAY * stats::std_pop(&ics)).exp();
    let sample_confidence = counts
        .iter()
        .map(|&n| (n as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0))
        .sum::<f64>()
        / counts.len() as f64;
    let sign_agreement = majority_sign_agreement(&ics);

    let score = 0.45 * strength
        + 0.30 * consistency
        + 0.15 * sample_confidence
        + 0.10 * sign_agreement;
    score.clamp(0.0, 1.0)
}

/// Fraction of ICs whose sign matches the majority sign.
///
/// The majority is taken over the ICs themselves, not over their mean: a
/// single large positive IC can lift the mean while most regimes disagree,
/// and agreement has to reflect that. An even split scores 0.5.
fn majority_sign_agreement(ics: &[f64]) -> f64 {
    if ics.is_empty() {
        return 0.0;
    }
    let positive = ics.iter().filter(|ic| **ic > 0.0).count();
    positive.max(ics.len() - positive) as f64 / ics.len() as f64
}
