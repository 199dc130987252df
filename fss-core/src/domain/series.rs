//! Series — a single date-indexed column (benchmark, volatility index).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Panel, PanelError};

/// Date-indexed numeric series.
///
/// Internally a one-ticker [`Panel`] would do, but the benchmark is used in
/// enough scalar-flavored ways (trailing medians, last value, regime windows)
/// that a dedicated type reads better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series. Dates must be strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, PanelError> {
        // Reuse the panel checks rather than duplicating them.
        let panel = Panel::new(dates, vec!["_".into()], values)?;
        Ok(Self {
            dates: panel.dates().to_vec(),
            values: panel.column(0),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Percentage change over `periods`; the first `periods` entries are NaN.
    pub fn pct_change(&self, periods: usize) -> Vec<f64> {
        let mut out = vec![f64::NAN; self.values.len()];
        for i in periods..self.values.len() {
            let base = self.values[i - periods];
            let cur = self.values[i];
            if base.is_nan() || cur.is_nan() || base == 0.0 {
                continue;
            }
            out[i] = cur / base - 1.0;
        }
        out
    }

    /// Simple one-period returns with the NaN head removed.
    pub fn simple_returns(&self) -> Vec<f64> {
        self.pct_change(1)
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect()
    }

    /// Entries strictly before `date`.
    pub fn truncate_before(&self, date: NaiveDate) -> Series {
        let end = self.dates.partition_point(|d| *d < date);
        Series {
            dates: self.dates[..end].to_vec(),
            values: self.values[..end].to_vec(),
        }
    }

    /// Restrict to a sorted date subset (intersection semantics).
    pub fn select_dates(&self, dates: &[NaiveDate]) -> Result<Series, PanelError> {
        let mut values = Vec::with_capacity(dates.len());
        for &date in dates {
            let idx = self
                .dates
                .binary_search(&date)
                .map_err(|_| PanelError::UnknownDate(date))?;
            values.push(self.values[idx]);
        }
        Ok(Series {
            dates: dates.to_vec(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(vals: &[f64]) -> Series {
        let dates = (0..vals.len())
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        Series::new(dates, vals.to_vec()).unwrap()
    }

    #[test]
    fn pct_change_head_is_nan() {
        let s = series(&[100.0, 110.0, 121.0]);
        let r = s.pct_change(1);
        assert!(r[0].is_nan());
        assert!((r[1] - 0.1).abs() < 1e-12);
        assert!((r[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn simple_returns_drops_head() {
        let s = series(&[100.0, 110.0, 121.0]);
        assert_eq!(s.simple_returns().len(), 2);
    }

    #[test]
    fn truncate_before_is_strict() {
        let s = series(&[1.0, 2.0, 3.0]);
        let cut = s.dates()[1];
        let t = s.truncate_before(cut);
        assert_eq!(t.values(), &[1.0]);
    }
}
