//! Market regime detection from benchmark trend and volatility.
//!
//! Two booleans drive the classification: benchmark above its trailing
//! 200-period moving average, and volatility below its trailing-year median.
//! Without a volatility-index series the benchmark's own realized
//! volatility stands in, at reduced confidence.

use serde::{Deserialize, Serialize};

use crate::domain::Series;
use crate::stats;

/// One of the four market regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Bull market, low volatility: steady growth.
    Expansion,
    /// Bull market, high volatility: high reward, high risk.
    Parabolic,
    /// Bear market, low volatility: slow bleed.
    Deflation,
    /// Bear market, high volatility: panic.
    Crisis,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::Expansion,
        Regime::Parabolic,
        Regime::Deflation,
        Regime::Crisis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Expansion => "Expansion",
            Regime::Parabolic => "Parabolic",
            Regime::Deflation => "Deflation",
            Regime::Crisis => "Crisis",
        }
    }

    fn classify(bull: bool, low_vol: bool) -> Regime {
        match (bull, low_vol) {
            (true, true) => Regime::Expansion,
            (true, false) => Regime::Parabolic,
            (false, true) => Regime::Deflation,
            (false, false) => Regime::Crisis,
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime classification for the latest date of the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regime: Regime,
    pub benchmark_above_long_ma: bool,
    pub volatility_below_median: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeDetector {
    /// Long moving-average period separating bull from bear.
    pub long_ma_period: usize,
    /// Trailing window for the volatility median (one year).
    pub median_window: usize,
    /// Short window for realized volatility when no vol index is supplied.
    pub realized_vol_window: usize,
}

impl Default for RegimeDetector {
    fn default() -> Self {
        Self {
            long_ma_period: 200,
            median_window: 252,
            realized_vol_window: 20,
        }
    }
}

impl RegimeDetector {
    /// Classify the latest date.
    ///
    /// Below `long_ma_period` observations the detector defaults to
    /// Expansion at confidence 0.5 rather than failing.
    pub fn detect(&self, benchmark: &Series, vol_index: Option<&Series>) -> RegimeResult {
        if benchmark.len() < self.long_ma_period {
            return RegimeResult {
                regime: Regime::Expansion,
                benchmark_above_long_ma: true,
                volatility_below_median: true,
                confidence: 0.5,
            };
        }

        let values = benchmark.values();
        let tail = &values[values.len() - self.long_ma_period..];
        let bull = values[values.len() - 1] > stats::mean(tail);

        let (low_vol, with_index) = match vol_index.filter(|v| v.len() >= self.median_window) {
            Some(vix) => {
                let v = vix.values();
                let window = &v[v.len() - self.median_window..];
                (v[v.len() - 1] < stats::median(window), true)
            }
            None => (self.realized_vol_below_median(benchmark), false),
        };

        RegimeResult {
            regime: Regime::classify(bull, low_vol),
            benchmark_above_long_ma: bull,
            volatility_below_median: low_vol,
            confidence: if with_index { 0.8 } else { 0.6 },
        }
    }

    /// Regime label per date, each computed from trailing data only.
    ///
    /// Safe to precompute over a full history: the label at index `i` never
    /// looks past `i`, so walk-forward slices can reuse it.
    pub fn label_series(&self, benchmark: &Series, vol_index: Option<&Series>) -> Vec<Regime> {
        (0..benchmark.len())
            .map(|i| {
                let cutoff = benchmark.dates()[i];
                let head = benchmark.truncate_before(cutoff + chrono::Days::new(1));
                let vol_head =
                    vol_index.map(|v| v.truncate_before(cutoff + chrono::Days::new(1)));
                self.detect(&head, vol_head.as_ref()).regime
            })
            .collect()
    }

    fn realized_vol_below_median(&self, benchmark: &Series) -> bool {
        let rets = benchmark.pct_change(1);
        let vols = stats::rolling_std(&rets, self.realized_vol_window);
        let last = match vols.iter().rev().find(|v| !v.is_nan()) {
            Some(&v) => v,
            None => return true,
        };
        let start = vols.len().saturating_sub(self.median_window);
        last < stats::median(&vols[start..])
    }
}
