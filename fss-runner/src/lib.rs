//! FSS Runner — portfolio allocation, performance metrics, and walk-forward
//! backtesting on top of `fss-core`.
//!
//! This crate builds on the scoring and signal engines to provide:
//! - Correlation-aware portfolio allocation (Kelly-constrained, risk parity,
//!   mean-variance)
//! - Equity-curve performance metrics
//! - A walk-forward backtester with a robustness-vs-forward-return log
//! - Seeded synthetic market data for tests and benchmarks
//! - TOML-loadable run configuration and CSV/JSON artifact export

pub mod allocator;
pub mod config;
pub mod correlation;
pub mod export;
pub mod metrics;
pub mod synthetic;
pub mod walk_forward;

pub use allocator::{
    AllocationError, AllocationMethod, AllocationResult, AllocatorConfig, PortfolioAllocator,
    TickerInputs,
};
pub use config::{BacktestConfig, ConfigError, RunId};
pub use correlation::CorrelationMatrix;
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use synthetic::{make_universe, PricePattern};
pub use walk_forward::{
    BacktestError, BacktestResult, Observation, Phase, RobustnessSummary, WalkForwardBacktester,
    WalkForwardConfig,
};
