//! Panel — dense date×ticker matrix.
//!
//! Row-major storage: `values[date_idx * n_tickers + ticker_idx]`. The date
//! index is strictly increasing and shared by every ticker column. Gaps in
//! the underlying data are NaN cells until `forward_fill` (prices) or
//! `fill_nan(0.0)` (volumes) is applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from panel construction and slicing.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("value buffer has {got} cells, expected {expected} ({dates} dates x {tickers} tickers)")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        dates: usize,
        tickers: usize,
    },
    #[error("date index is not strictly increasing at position {0}")]
    NonMonotonicDates(usize),
    #[error("duplicate ticker '{0}'")]
    DuplicateTicker(String),
    #[error("date {0} not in panel index")]
    UnknownDate(NaiveDate),
}

/// Date-indexed matrix with one column per ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Vec<f64>,
}

impl Panel {
    /// Build a panel from a row-major value buffer.
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, PanelError> {
        let expected = dates.len() * tickers.len();
        if values.len() != expected {
            return Err(PanelError::ShapeMismatch {
                expected,
                got: values.len(),
                dates: dates.len(),
                tickers: tickers.len(),
            });
        }
        for i in 1..dates.len() {
            if dates[i] <= dates[i - 1] {
                return Err(PanelError::NonMonotonicDates(i));
            }
        }
        for (i, t) in tickers.iter().enumerate() {
            if tickers[..i].contains(t) {
                return Err(PanelError::DuplicateTicker(t.clone()));
            }
        }
        Ok(Self {
            dates,
            tickers,
            values,
        })
    }

    /// Panel filled with a constant value (commonly the neutral score 50).
    pub fn filled(dates: Vec<NaiveDate>, tickers: Vec<String>, fill: f64) -> Self {
        let values = vec![fill; dates.len() * tickers.len()];
        Self {
            dates,
            tickers,
            values,
        }
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn n_tickers(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.tickers.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    #[inline]
    pub fn get(&self, date_idx: usize, ticker_idx: usize) -> f64 {
        self.values[date_idx * self.tickers.len() + ticker_idx]
    }

    #[inline]
    pub fn set(&mut self, date_idx: usize, ticker_idx: usize, value: f64) {
        self.values[date_idx * self.tickers.len() + ticker_idx] = value;
    }

    /// One date's cross-section, in ticker order.
    pub fn row(&self, date_idx: usize) -> &[f64] {
        let n = self.tickers.len();
        &self.values[date_idx * n..(date_idx + 1) * n]
    }

    /// One ticker's full history, in date order. Allocates.
    pub fn column(&self, ticker_idx: usize) -> Vec<f64> {
        (0..self.dates.len())
            .map(|d| self.get(d, ticker_idx))
            .collect()
    }

    /// Last cross-section, or None for an empty panel.
    pub fn last_row(&self) -> Option<&[f64]> {
        if self.dates.is_empty() {
            None
        } else {
            Some(self.row(self.dates.len() - 1))
        }
    }

    /// Carry the last observed value forward over NaN gaps, per column.
    ///
    /// Leading NaNs (before the first observation) are left untouched.
    pub fn forward_fill(&mut self) {
        let n = self.tickers.len();
        for t in 0..n {
            let mut last = f64::NAN;
            for d in 0..self.dates.len() {
                let v = self.values[d * n + t];
                if v.is_nan() {
                    if !last.is_nan() {
                        self.values[d * n + t] = last;
                    }
                } else {
                    last = v;
                }
            }
        }
    }

    /// Replace every NaN cell with `value` (volume panels use 0.0).
    pub fn fill_nan(&mut self, value: f64) {
        for v in &mut self.values {
            if v.is_nan() {
                *v = value;
            }
        }
    }

    /// Percentage change over `periods` rows. The first `periods` rows are NaN.
    ///
    /// A zero or NaN base maps to NaN rather than +/-inf.
    pub fn pct_change(&self, periods: usize) -> Panel {
        let n = self.tickers.len();
        let mut out = vec![f64::NAN; self.values.len()];
        for d in periods..self.dates.len() {
            for t in 0..n {
                let base = self.get(d - periods, t);
                let cur = self.get(d, t);
                if base.is_nan() || cur.is_nan() || base == 0.0 {
                    continue;
                }
                out[d * n + t] = cur / base - 1.0;
            }
        }
        Panel {
            dates: self.dates.clone(),
            tickers: self.tickers.clone(),
            values: out,
        }
    }

    /// Rows `[start, end)` as a new panel.
    pub fn slice_rows(&self, start: usize, end: usize) -> Panel {
        let n = self.tickers.len();
        Panel {
            dates: self.dates[start..end].to_vec(),
            tickers: self.tickers.clone(),
            values: self.values[start * n..end * n].to_vec(),
        }
    }

    /// All rows strictly before `date`. The walk-forward training slice.
    pub fn truncate_before(&self, date: NaiveDate) -> Panel {
        let end = self.dates.partition_point(|d| *d < date);
        self.slice_rows(0, end)
    }

    /// Restrict the panel to the given sorted date subset.
    pub fn select_dates(&self, dates: &[NaiveDate]) -> Result<Panel, PanelError> {
        let n = self.tickers.len();
        let mut values = Vec::with_capacity(dates.len() * n);
        for &date in dates {
            let di = self
                .date_index(date)
                .ok_or(PanelError::UnknownDate(date))?;
            values.extend_from_slice(self.row(di));
        }
        Panel::new(dates.to_vec(), self.tickers.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect()
    }

    fn two_ticker_panel() -> Panel {
        Panel::new(
            dates(3),
            vec!["AAA".into(), "BBB".into()],
            vec![1.0, 10.0, 2.0, 20.0, 4.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = Panel::new(dates(2), vec!["AAA".into()], vec![1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(PanelError::ShapeMismatch { .. })));
    }

    #[test]
    fn duplicate_ticker_rejected() {
        let err = Panel::new(
            dates(1),
            vec!["AAA".into(), "AAA".into()],
            vec![1.0, 2.0],
        );
        assert!(matches!(err, Err(PanelError::DuplicateTicker(_))));
    }

    #[test]
    fn rows_and_columns() {
        let p = two_ticker_panel();
        assert_eq!(p.row(1), &[2.0, 20.0]);
        assert_eq!(p.column(0), vec![1.0, 2.0, 4.0]);
        assert_eq!(p.last_row().unwrap(), &[4.0, 40.0]);
    }

    #[test]
    fn pct_change_basic() {
        let p = two_ticker_panel();
        let r = p.pct_change(1);
        assert!(r.get(0, 0).is_nan());
        assert!((r.get(1, 0) - 1.0).abs() < 1e-12);
        assert!((r.get(2, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn forward_fill_carries_last_value() {
        let mut p = Panel::new(
            dates(4),
            vec!["AAA".into()],
            vec![f64::NAN, 2.0, f64::NAN, 5.0],
        )
        .unwrap();
        p.forward_fill();
        assert!(p.get(0, 0).is_nan()); // leading gap stays
        assert_eq!(p.get(2, 0), 2.0);
        assert_eq!(p.get(3, 0), 5.0);
    }

    #[test]
    fn truncate_before_excludes_cutoff_date() {
        let p = two_ticker_panel();
        let cut = p.dates()[2];
        let t = p.truncate_before(cut);
        assert_eq!(t.n_dates(), 2);
        assert!(t.dates().iter().all(|d| *d < cut));
    }

    #[test]
    fn select_dates_subset() {
        let p = two_ticker_panel();
        let subset = vec![p.dates()[0], p.dates()[2]];
        let s = p.select_dates(&subset).unwrap();
        assert_eq!(s.n_dates(), 2);
        assert_eq!(s.row(1), &[4.0, 40.0]);
    }

    #[test]
    fn serialization_roundtrip() {
        let p = two_ticker_panel();
        let json = serde_json::to_string(&p).unwrap();
        let back: Panel = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
