//! Pairwise return-correlation matrix for a ticker universe.

use serde::{Deserialize, Serialize};

use fss_core::domain::Panel;
use fss_core::stats;

/// Symmetric correlation matrix with unit diagonal, indexed by ticker order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Correlations of period-over-period returns derived from a price panel.
    pub fn from_price_panel(prices: &Panel) -> Self {
        Self::from_returns(&prices.pct_change(1))
    }

    /// Correlations of the columns of a returns panel. NaN pairs are dropped
    /// per column pair; degenerate columns correlate at 0.
    pub fn from_returns(returns: &Panel) -> Self {
        let n = returns.n_tickers();
        let columns: Vec<Vec<f64>> = (0..n).map(|t| returns.column(t)).collect();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in i + 1..n {
                let mut a = Vec::new();
                let mut b = Vec::new();
                for k in 0..columns[i].len() {
                    if columns[i][k].is_finite() && columns[j][k].is_finite() {
                        a.push(columns[i][k]);
                        b.push(columns[j][k]);
                    }
                }
                let c = stats::pearson(&a, &b);
                values[i * n + j] = c;
                values[j * n + i] = c;
            }
        }
        Self {
            tickers: returns.tickers().to_vec(),
            values,
        }
    }

    pub fn n(&self) -> usize {
        self.tickers.len()
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn index_of(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n() + j]
    }

    /// Worst-case |correlation| of ticker `i` against every other ticker.
    pub fn max_abs_offdiag(&self, i: usize) -> f64 {
        (0..self.n())
            .filter(|&j| j != i)
            .map(|j| self.get(i, j).abs())
            .fold(0.0, f64::max)
    }

    /// Average |correlation| of ticker `i` against every other ticker.
    pub fn mean_abs_offdiag(&self, i: usize) -> f64 {
        let n = self.n();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .filter(|&j| j != i)
            .map(|j| self.get(i, j).abs())
            .sum::<f64>()
            / (n - 1) as f64
    }

    /// Average |correlation| over all distinct pairs.
    pub fn mean_abs_pairwise(&self) -> f64 {
        let n = self.n();
        if n < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..n {
            for j in i + 1..n {
                sum += self.get(i, j).abs();
                count += 1;
            }
        }
        sum / count as f64
    }

    /// Restrict the matrix to a ticker subset, in the given order.
    pub fn select(&self, tickers: &[String]) -> Option<CorrelationMatrix> {
        let indices: Vec<usize> = tickers
            .iter()
            .map(|t| self.index_of(t))
            .collect::<Option<Vec<_>>>()?;
        let n = indices.len();
        let mut values = vec![0.0; n * n];
        for (a, &i) in indices.iter().enumerate() {
            for (b, &j) in indices.iter().enumerate() {
                values[a * n + b] = self.get(i, j);
            }
        }
        Some(CorrelationMatrix {
            tickers: tickers.to_vec(),
            values,
        })
    }
}
