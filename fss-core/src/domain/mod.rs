//! Domain types — date-indexed panels and series.
//!
//! All inputs to the scoring core are materialized in memory before any
//! computation starts. A [`Panel`] is a dense date×ticker matrix (adjusted
//! close, volume, or a fundamental metric); a [`Series`] is a single
//! date-indexed column (benchmark, volatility index). Missing observations
//! are NaN until a fill policy is applied.

mod panel;
mod series;

pub use panel::{Panel, PanelError};
pub use series::Series;

use chrono::NaiveDate;

/// Intersection of two sorted date domains, preserving order.
///
/// Used when a panel and the benchmark series diverge: the core operates on
/// the common dates only.
pub fn common_dates(a: &[NaiveDate], b: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
