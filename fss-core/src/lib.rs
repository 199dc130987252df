//! FSS Core — multi-factor stock scoring, regime detection, and signals.
//!
//! This crate contains the scoring heart of the system:
//! - Domain types (date×ticker panels, date-indexed series)
//! - Four factor components (trend, fundamental, capital flow, risk)
//! - Market regime detection from benchmark trend and volatility
//! - The Future Success Score engine with regime-dependent weights,
//!   interaction adjustments, and robustness diagnostics
//! - Safety filters (liquidity, solvency) with pluggable solvency models
//! - Per-ticker signals: mean reversion, momentum, Kelly sizing
//! - An injectable score cache keyed on ticker + date + config hash
//!
//! Every result is a pure function of its inputs. Nothing here fetches
//! data, persists state, or shares mutable state between tickers; the
//! caller owns all of that.

pub mod cache;
pub mod domain;
pub mod factors;
pub mod regime;
pub mod safety;
pub mod scoring;
pub mod signals;
pub mod stats;
