//! Signal Stability Rating.
//!
//! Scores how steady a signal's behavior is over one ticker's history:
//! does the score persist, does its predictive correlation keep a stable
//! sign and magnitude, and does the score level stay well-behaved.

use crate::stats;

const MIN_OBSERVATIONS: usize = 80;
const IC_WINDOW: usize = 60;
const IC_STEP: usize = 10;
const PERSISTENCE_LAGS: [usize; 3] = [5, 10, 20];
const COVERAGE_FULL: f64 = 252.0;
const CV_DECAY: f64 = 1.2;

/// Stability of a (score, forward-return) history, in [0,1].
///
/// Histories shorter than 80 aligned observations are indeterminate and
/// rate 0.5.
pub fn signal_stability(scores: &[f64], fwd_returns: &[f64]) -> f64 {
    let n = scores.len().min(fwd_returns.len());
    let mut s = Vec::with_capacity(n);
    let mut r = Vec::with_capacity(n);
    for i in 0..n {
        if scores[i].is_finite() && fwd_returns[i].is_finite() {
            s.push(scores[i]);
            r.push(fwd_returns[i]);
        }
    }
    if s.len() < MIN_OBSERVATIONS {
        return 0.5;
    }

    // Persistence: autocorrelation of the score at three lags, rescaled
    // from [-1,1] onto [0,1].
    let persistence = PERSISTENCE_LAGS
        .iter()
        .map(|&lag| (stats::autocorrelation(&s, lag) + 1.0) / 2.0)
        .sum::<f64>()
        / PERSISTENCE_LAGS.len() as f64;

    // Rolling IC over strided windows.
    let ics = rolling_ic(&s, &r);
    let mean_ic = stats::mean(&ics);
    let std_ic = stats::std_pop(&ics);
    let snr = if std_ic < 1e-12 {
        if mean_ic.abs() > 1e-12 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - (-mean_ic.abs() / std_ic).exp()
    };

    // Coefficient of variation of the score level.
    let mean_s = stats::mean(&s);
    let vol_stability = if mean_s.abs() < 1e-12 {
        0.0
    } else {
        (-CV_DECAY * stats::std_pop(&s) / mean_s.abs()).exp()
    };

    let flips = ics
        .windows(2)
        .filter(|w| w[0].signum() != w[1].signum())
        .count();
    let flip_stability = if ics.len() > 1 {
        1.0 - flips as f64 / (ics.len() - 1) as f64
    } else {
        0.5
    };

    let coverage = (s.len() as f64 / COVERAGE_FULL).min(1.0);
    let rating = coverage
        * (0.35 * persistence + 0.35 * snr + 0.15 * vol_stability + 0.15 * flip_stability);
    rating.clamp(0.0, 1.0)
}

fn rolling_ic(scores: &[f64], fwd_returns: &[f64]) -> Vec<f64> {
    let n = scores.len();
    let mut ics = Vec::new();
    let mut start = 0;
    while start + IC_WINDOW <= n {
        let end = start + IC_WINDOW;
        ics.push(stats::spearman(&scores[start..end], &fwd_returns[start..end]));
        start += IC_STEP;
    }
    ics
}
