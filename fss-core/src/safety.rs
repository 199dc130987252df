//! Safety filter: liquidity and financial-distress screens.
//!
//! A ticker must clear every check to pass. The first failing check
//! short-circuits with a reason string; scoring still runs on failed
//! tickers, it only marks them as filtered.
//!
//! The solvency score is pluggable behind [`SolvencyModel`]. The default
//! [`AltmanZ`] model uses the classic five-ratio formula with market value
//! over total assets standing in for the market-value/liabilities term.

use serde::{Deserialize, Serialize};

use crate::domain::Panel;
use crate::stats;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Minimum trailing average share volume.
    pub min_avg_volume: f64,
    /// Trailing window for the liquidity average, in periods.
    pub liquidity_window: usize,
    /// Solvency score below this is financial distress (fail).
    pub distress_threshold: f64,
    /// Solvency score below this (and above distress) is the grey zone
    /// (pass, flagged for monitoring).
    pub grey_threshold: f64,
    /// Earnings-quality score above this flags manipulation risk (fail).
    pub earnings_quality_threshold: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            min_avg_volume: 1_000_000.0,
            liquidity_window: 30,
            distress_threshold: 1.8,
            grey_threshold: 2.99,
            earnings_quality_threshold: -1.78,
        }
    }
}

// ─── Solvency models ─────────────────────────────────────────────────────────

/// Balance-sheet inputs for a solvency score, all in the same currency unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BalanceSheetInputs {
    pub working_capital: f64,
    pub retained_earnings: f64,
    pub ebit: f64,
    pub market_value: f64,
    pub sales: f64,
    pub total_assets: f64,
}

/// Where a solvency score lands relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolvencyZone {
    Distress,
    Grey,
    Safe,
}

/// Maps balance-sheet inputs to a scalar solvency score.
pub trait SolvencyModel: Send + Sync {
    fn score(&self, inputs: &BalanceSheetInputs) -> f64;
}

/// Altman Z-Score:
/// Z = 1.2·WC/TA + 1.4·RE/TA + 3.3·EBIT/TA + 0.6·MV/TA + 1.0·S/TA.
///
/// Zero total assets scores 0.0, which lands in the distress zone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AltmanZ;

impl SolvencyModel for AltmanZ {
    fn score(&self, inputs: &BalanceSheetInputs) -> f64 {
        let ta = inputs.total_assets;
        if ta == 0.0 || !ta.is_finite() {
            return 0.0;
        }
        1.2 * (inputs.working_capital / ta)
            + 1.4 * (inputs.retained_earnings / ta)
            + 3.3 * (inputs.ebit / ta)
            + 0.6 * (inputs.market_value / ta)
            + 1.0 * (inputs.sales / ta)
    }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Outcome of the full safety screen for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub passed: bool,
    pub reason: String,
}

impl SafetyVerdict {
    fn fail(reason: String) -> Self {
        Self {
            passed: false,
            reason,
        }
    }
}

pub struct SafetyFilter {
    pub config: SafetyConfig,
    solvency: Box<dyn SolvencyModel>,
}

impl SafetyFilter {
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            solvency: Box::new(AltmanZ),
        }
    }

    pub fn with_solvency_model(config: SafetyConfig, model: Box<dyn SolvencyModel>) -> Self {
        Self {
            config,
            solvency: model,
        }
    }

    pub fn zone(&self, score: f64) -> SolvencyZone {
        if score < self.config.distress_threshold {
            SolvencyZone::Distress
        } else if score < self.config.grey_threshold {
            SolvencyZone::Grey
        } else {
            SolvencyZone::Safe
        }
    }

    /// Trailing-average-volume liquidity check for one ticker.
    pub fn check_liquidity(&self, volumes: &Panel, ticker: &str) -> SafetyVerdict {
        let Some(t) = volumes.ticker_index(ticker) else {
            return SafetyVerdict::fail("Ticker not in volume data".to_string());
        };
        let col = volumes.column(t);
        let rolled = stats::rolling_mean(&col, self.config.liquidity_window);
        let avg = rolled.last().copied().unwrap_or(f64::NAN);
        if avg.is_nan() || avg < self.config.min_avg_volume {
            return SafetyVerdict::fail(format!(
                "Low liquidity: {avg:.0} avg volume < {:.0}",
                self.config.min_avg_volume
            ));
        }
        SafetyVerdict {
            passed: true,
            reason: "Liquidity OK".to_string(),
        }
    }

    /// Solvency check against the configured thresholds.
    pub fn check_solvency(&self, inputs: &BalanceSheetInputs) -> SafetyVerdict {
        let z = self.solvency.score(inputs);
        match self.zone(z) {
            SolvencyZone::Distress => SafetyVerdict::fail(format!(
                "Financial distress: solvency score {z:.2} < {}",
                self.config.distress_threshold
            )),
            SolvencyZone::Grey => SafetyVerdict {
                passed: true,
                reason: format!("Grey zone: solvency score {z:.2} (monitor)"),
            },
            SolvencyZone::Safe => SafetyVerdict {
                passed: true,
                reason: format!("Safe: solvency score {z:.2}"),
            },
        }
    }

    /// Run every check for one ticker, first failure wins.
    ///
    /// `balance_sheet` and `earnings_quality` are optional: when absent the
    /// corresponding check is skipped rather than failed.
    pub fn check(
        &self,
        ticker: &str,
        volumes: &Panel,
        balance_sheet: Option<&BalanceSheetInputs>,
        earnings_quality: Option<f64>,
    ) -> SafetyVerdict {
        let liquidity = self.check_liquidity(volumes, ticker);
        if !liquidity.passed {
            return liquidity;
        }
        let mut reasons = vec![liquidity.reason];

        if let Some(inputs) = balance_sheet {
            let solvency = self.check_solvency(inputs);
            if !solvency.passed {
                return solvency;
            }
            reasons.push(solvency.reason);
        }

        if let Some(m) = earnings_quality {
            if m > self.config.earnings_quality_threshold {
                return SafetyVerdict::fail(format!(
                    "Earnings manipulation risk: M-Score {m:.2} > {}",
                    self.config.earnings_quality_threshold
                ));
            }
            reasons.push(format!("M-Score OK: {m:.2}"));
        }

        SafetyVerdict {
            passed: true,
            reason: reasons.join(" | "),
        }
    }
}
