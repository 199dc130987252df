//! TOML-loadable backtest configuration.
//!
//! `BacktestConfig` is the flat, file-friendly view of a run: the universe
//! plus the scalar knobs of the schedule and allocator. It validates into a
//! [`WalkForwardConfig`](crate::walk_forward::WalkForwardConfig), leaving the
//! scoring and Kelly sub-configs at their defaults unless the caller replaces
//! them in code.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::{AllocationMethod, AllocatorConfig};
use crate::walk_forward::WalkForwardConfig;

/// Content-addressable identifier for one run configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("universe is empty")]
    EmptyUniverse,
    #[error("training window must be positive")]
    ZeroTrainingWindow,
    #[error("rebalance interval must be positive")]
    ZeroRebalanceInterval,
    #[error("initial capital {0} must be positive")]
    NonPositiveCapital(f64),
    #[error("transaction cost {0} bps must be non-negative")]
    NegativeTransactionCost(f64),
    #[error("minimum robustness {0} must be in [0,1]")]
    RobustnessOutOfRange(f64),
    #[error("position bounds [{min}, {max}] are contradictory")]
    InvalidPositionBounds { min: f64, max: f64 },
}

/// One backtest run, as written in a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub universe: Vec<String>,
    pub training_window: usize,
    pub rebalance_every: usize,
    pub transaction_cost_bps: f64,
    pub min_robustness: f64,
    pub top_n: usize,
    pub method: AllocationMethod,
    pub initial_capital: f64,
    pub max_position_size: f64,
    pub min_position_size: f64,
    pub target_correlation: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let wf = WalkForwardConfig::default();
        let alloc = AllocatorConfig::default();
        Self {
            universe: Vec::new(),
            training_window: wf.training_window,
            rebalance_every: wf.rebalance_every,
            transaction_cost_bps: wf.transaction_cost_bps,
            min_robustness: wf.min_robustness,
            top_n: wf.top_n,
            method: wf.method,
            initial_capital: wf.initial_capital,
            max_position_size: alloc.max_position_size,
            min_position_size: alloc.min_position_size,
            target_correlation: alloc.target_correlation,
            risk_free_rate: alloc.risk_free_rate,
        }
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        if self.training_window == 0 {
            return Err(ConfigError::ZeroTrainingWindow);
        }
        if self.rebalance_every == 0 {
            return Err(ConfigError::ZeroRebalanceInterval);
        }
        if self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.transaction_cost_bps < 0.0 {
            return Err(ConfigError::NegativeTransactionCost(
                self.transaction_cost_bps,
            ));
        }
        if !(0.0..=1.0).contains(&self.min_robustness) {
            return Err(ConfigError::RobustnessOutOfRange(self.min_robustness));
        }
        if self.min_position_size < 0.0
            || self.max_position_size > 1.0
            || self.min_position_size >= self.max_position_size
        {
            return Err(ConfigError::InvalidPositionBounds {
                min: self.min_position_size,
                max: self.max_position_size,
            });
        }
        Ok(())
    }

    /// Deterministic hash of the full configuration. Two runs with the same
    /// id are reproductions of each other.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).expect("config serialization cannot fail");
        blake3::hash(&json).to_hex().to_string()
    }

    /// Expand into the backtester's config, with default scoring and Kelly
    /// settings.
    pub fn to_walk_forward(&self) -> WalkForwardConfig {
        WalkForwardConfig {
            training_window: self.training_window,
            rebalance_every: self.rebalance_every,
            transaction_cost_bps: self.transaction_cost_bps,
            min_robustness: self.min_robustness,
            top_n: self.top_n,
            method: self.method,
            initial_capital: self.initial_capital,
            allocator: AllocatorConfig {
                max_position_size: self.max_position_size,
                min_position_size: self.min_position_size,
                target_correlation: self.target_correlation,
                risk_free_rate: self.risk_free_rate,
            },
            ..WalkForwardConfig::default()
        }
    }
}
