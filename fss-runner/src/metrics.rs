//! Performance metrics — pure functions from equity curves to statistics.
//!
//! No dependencies on the backtester or allocator; everything here is
//! equity curve (and optionally a benchmark curve) in, scalar out.

use serde::{Deserialize, Serialize};

/// Aggregate performance statistics for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub annualized_volatility: f64,
    pub sharpe: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    /// Annualized excess return over the benchmark; 0 without a benchmark.
    pub alpha: f64,
    /// Mean active return over its tracking error; 0 without a benchmark.
    pub information_ratio: f64,
}

impl PerformanceMetrics {
    pub fn compute(
        equity_curve: &[f64],
        benchmark_curve: Option<&[f64]>,
        risk_free_rate: f64,
    ) -> Self {
        let days = equity_curve.len();
        Self {
            total_return: total_return(equity_curve),
            cagr: cagr(equity_curve, days),
            annualized_volatility: annualized_volatility(equity_curve),
            sharpe: sharpe_ratio(equity_curve, risk_free_rate),
            calmar: calmar_ratio(equity_curve, days),
            max_drawdown: max_drawdown(equity_curve),
            alpha: benchmark_curve.map_or(0.0, |b| alpha(equity_curve, b)),
            information_ratio: benchmark_curve.map_or(0.0, |b| information_ratio(equity_curve, b)),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final − initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    if initial <= 0.0 {
        return 0.0;
    }
    (equity_curve[equity_curve.len() - 1] - initial) / initial
}

/// Compound annual growth rate, assuming 252 trading days per year.
pub fn cagr(equity_curve: &[f64], trading_days: usize) -> f64 {
    if equity_curve.len() < 2 || trading_days < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = equity_curve[equity_curve.len() - 1];
    if initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / 252.0;
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Annualized standard deviation of daily returns.
pub fn annualized_volatility(equity_curve: &[f64]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(&returns) * (252.0_f64).sqrt()
}

/// Annualized Sharpe ratio from daily returns.
///
/// Returns 0.0 if variance is zero or fewer than 2 bars.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / 252.0;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean(&excess) / std) * (252.0_f64).sqrt()
}

/// Calmar ratio: CAGR / |max drawdown|.
///
/// Returns 0.0 if max drawdown is zero or CAGR is non-positive.
pub fn calmar_ratio(equity_curve: &[f64], trading_days: usize) -> f64 {
    let c = cagr(equity_curve, trading_days);
    let dd = max_drawdown(equity_curve);
    if dd >= 0.0 || c <= 0.0 {
        return 0.0;
    }
    c / dd.abs()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    drawdown_series(equity_curve)
        .into_iter()
        .fold(0.0, f64::min)
}

/// Per-bar drawdown from the running peak, each value ≤ 0.
pub fn drawdown_series(equity_curve: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    equity_curve
        .iter()
        .map(|&eq| {
            if eq > peak {
                peak = eq;
            }
            if peak > 0.0 {
                (eq - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized mean active return over the benchmark.
pub fn alpha(equity_curve: &[f64], benchmark_curve: &[f64]) -> f64 {
    let active = active_returns(equity_curve, benchmark_curve);
    if active.is_empty() {
        return 0.0;
    }
    mean(&active) * 252.0
}

/// Mean active return over its standard deviation, annualized.
pub fn information_ratio(equity_curve: &[f64], benchmark_curve: &[f64]) -> f64 {
    let active = active_returns(equity_curve, benchmark_curve);
    if active.len() < 2 {
        return 0.0;
    }
    let te = std_dev(&active);
    if te < 1e-15 {
        return 0.0;
    }
    (mean(&active) / te) * (252.0_f64).sqrt()
}

fn active_returns(equity_curve: &[f64], benchmark_curve: &[f64]) -> Vec<f64> {
    let a = daily_returns(equity_curve);
    let b = daily_returns(benchmark_curve);
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x - y)
        .collect()
}

fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter_map(|w| {
            if w[0] > 0.0 && w[0].is_finite() && w[1].is_finite() {
                Some(w[1] / w[0] - 1.0)
            } else {
                None
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
