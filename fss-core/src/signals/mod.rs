//! Per-ticker trading signals computed from price history alone:
//! mean reversion, momentum, and Kelly position sizing.

mod kelly;
mod mean_reversion;
mod momentum;

pub use kelly::{KellyConfig, KellyResult};
pub use mean_reversion::{MeanReversionConfig, MeanReversionSignal};
pub use momentum::{MomentumAlignment, MomentumConfig, MomentumSignal};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Panel, Series};

/// All three signals for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSignals {
    pub ticker: String,
    pub mean_reversion: MeanReversionSignal,
    pub momentum: MomentumSignal,
    pub kelly: KellyResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalEngine {
    pub mean_reversion: MeanReversionConfig,
    pub momentum: MomentumConfig,
    pub kelly: KellyConfig,
}

impl SignalEngine {
    /// Compute the three signals for every ticker in the panel.
    ///
    /// Tickers are independent, so the universe fans out across the rayon
    /// pool. Results come back in panel ticker order.
    pub fn analyze_universe(&self, prices: &Panel, benchmark: &Series) -> Vec<TickerSignals> {
        (0..prices.n_tickers())
            .into_par_iter()
            .map(|t| {
                let ticker = prices.tickers()[t].clone();
                self.analyze_ticker(&ticker, &prices.column(t), benchmark)
            })
            .collect()
    }

    pub fn analyze_ticker(
        &self,
        ticker: &str,
        prices: &[f64],
        benchmark: &Series,
    ) -> TickerSignals {
        let returns = simple_returns(prices);
        TickerSignals {
            ticker: ticker.to_string(),
            mean_reversion: self.mean_reversion.compute(ticker, prices),
            momentum: self.momentum.compute(ticker, prices, Some(benchmark.values())),
            kelly: self.kelly.compute(ticker, &returns),
        }
    }
}

/// Simple period-over-period returns, skipping NaN and zero bases.
pub(crate) fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter_map(|w| {
            if w[0].is_finite() && w[1].is_finite() && w[0] != 0.0 {
                Some(w[1] / w[0] - 1.0)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn simple_returns_skip_bad_bases() {
        let r = simple_returns(&[100.0, 110.0, f64::NAN, 120.0, 0.0, 50.0]);
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn universe_preserves_ticker_order() {
        let n = 150;
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];
        let prices = Panel::filled(dates.clone(), tickers, 100.0);
        let bench = Series::new(dates, vec![100.0; n]).unwrap();

        let signals = SignalEngine::default().analyze_universe(&prices, &bench);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].ticker, "AAA");
        assert_eq!(signals[1].ticker, "BBB");
    }
}
