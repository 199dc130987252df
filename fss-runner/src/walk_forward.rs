//! Walk-forward backtest of the full scoring → signals → allocation pipeline.
//!
//! The backtester walks a rebalance schedule through the price panel. At each
//! rebalance date it truncates every input strictly before that date, scores
//! the universe, keeps the safe and robust names, sizes them with Kelly
//! fractions, hands them to the allocator, and holds the resulting weights
//! until the next rebalance. Daily portfolio returns are applied with a
//! one-day lag and charged turnover × transaction cost.
//!
//! The observation log (date, ticker, robustness, forward return, weight)
//! exists to answer one question: do higher-robustness names actually earn
//! better forward returns out of sample?

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use fss_core::domain::{Panel, Series};
use fss_core::scoring::{ScoringConfig, ScoringEngine, ScoringError, ScoringInputs};
use fss_core::signals::KellyConfig;
use fss_core::stats;

use crate::allocator::{
    AllocationError, AllocationMethod, AllocatorConfig, PortfolioAllocator, TickerInputs,
};
use crate::metrics::{drawdown_series, PerformanceMetrics};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Rows of history required before the first rebalance.
    pub training_window: usize,
    /// Holding period between rebalances, in rows.
    pub rebalance_every: usize,
    /// Cost charged per unit of turnover, in basis points.
    pub transaction_cost_bps: f64,
    /// Candidates below this regime robustness are excluded.
    pub min_robustness: f64,
    /// Position cap per rebalance, by descending score.
    pub top_n: usize,
    pub method: AllocationMethod,
    pub initial_capital: f64,
    pub scoring: ScoringConfig,
    pub kelly: KellyConfig,
    pub allocator: AllocatorConfig,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            training_window: 252,
            rebalance_every: 21,
            transaction_cost_bps: 5.0,
            min_robustness: 0.5,
            top_n: 20,
            method: AllocationMethod::KellyConstrained,
            initial_capital: 100_000.0,
            scoring: ScoringConfig::default(),
            kelly: KellyConfig::default(),
            allocator: AllocatorConfig::default(),
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Where the backtester currently is in its rebalance cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingTrainingWindow,
    Scoring,
    Allocating,
    Holding,
    Complete,
}

/// One held position over one holding window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub ticker: String,
    pub robustness: f64,
    /// Realized return over the holding window that started at `date`.
    pub forward_return: f64,
    pub weight: f64,
}

/// Return statistics for one robustness bucket of the observation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub mean_return: f64,
    pub median_return: f64,
    pub win_rate: f64,
    pub count: usize,
}

impl BucketStats {
    fn from_returns(returns: &[f64]) -> Self {
        if returns.is_empty() {
            return Self {
                mean_return: 0.0,
                median_return: 0.0,
                win_rate: 0.0,
                count: 0,
            };
        }
        Self {
            mean_return: stats::mean(returns),
            median_return: stats::median(returns),
            win_rate: returns.iter().filter(|&&r| r > 0.0).count() as f64
                / returns.len() as f64,
            count: returns.len(),
        }
    }
}

/// Does robustness predict forward returns? Split at 0.7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessSummary {
    /// Pearson correlation between robustness and forward return.
    pub correlation: f64,
    pub high: BucketStats,
    pub low: BucketStats,
}

const ROBUSTNESS_SPLIT: f64 = 0.7;

impl RobustnessSummary {
    pub(crate) fn from_observations(observations: &[Observation]) -> Self {
        let rob: Vec<f64> = observations.iter().map(|o| o.robustness).collect();
        let fwd: Vec<f64> = observations.iter().map(|o| o.forward_return).collect();
        let (high, low): (Vec<&Observation>, Vec<&Observation>) = observations
            .iter()
            .partition(|o| o.robustness >= ROBUSTNESS_SPLIT);
        Self {
            correlation: stats::pearson(&rob, &fwd),
            high: BucketStats::from_returns(
                &high.iter().map(|o| o.forward_return).collect::<Vec<_>>(),
            ),
            low: BucketStats::from_returns(
                &low.iter().map(|o| o.forward_return).collect::<Vec<_>>(),
            ),
        }
    }
}

/// Complete output of one walk-forward run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub dates: Vec<NaiveDate>,
    pub equity_curve: Vec<f64>,
    pub drawdown: Vec<f64>,
    pub metrics: PerformanceMetrics,
    pub rebalance_dates: Vec<NaiveDate>,
    pub allocations_by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
    pub robustness_by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
    pub observations: Vec<Observation>,
    pub robustness_summary: RobustnessSummary,
    /// Mean daily sum of |weight changes|.
    pub avg_turnover: f64,
    /// Mean count of nonzero positions over invested days.
    pub avg_position_count: f64,
    pub final_phase: Phase,
}

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("insufficient history: {have} rows, need at least {need}")]
    InsufficientHistory { have: usize, need: usize },
    #[error("scoring failed at {date}")]
    Scoring {
        date: NaiveDate,
        #[source]
        source: ScoringError,
    },
    #[error("allocation failed at {date}")]
    Allocation {
        date: NaiveDate,
        #[source]
        source: AllocationError,
    },
}

// ─── Schedule ────────────────────────────────────────────────────────

/// Row indices of the rebalance dates: the first row with a full training
/// window behind it, then every `rebalance_every` rows after that.
pub fn rebalance_indices(n_dates: usize, config: &WalkForwardConfig) -> Vec<usize> {
    (config.training_window..n_dates)
        .step_by(config.rebalance_every.max(1))
        .collect()
}

// ─── Backtester ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WalkForwardBacktester {
    pub config: WalkForwardConfig,
}

struct RebalancePlan {
    weights: BTreeMap<String, f64>,
    robustness: BTreeMap<String, f64>,
}

impl WalkForwardBacktester {
    pub fn new(config: WalkForwardConfig) -> Self {
        Self { config }
    }

    /// Run the backtest over the full panel history.
    ///
    /// Every rebalance sees only rows strictly before its date. A rebalance
    /// with no qualifying candidates leaves the book in cash for that window
    /// rather than failing the run.
    pub fn run(
        &self,
        prices: &Panel,
        volumes: &Panel,
        benchmark: &Series,
        vol_index: Option<&Series>,
        universe: &[String],
    ) -> Result<BacktestResult, BacktestError> {
        let n_dates = prices.n_dates();
        let need = self.config.training_window + 2;
        if n_dates < need {
            return Err(BacktestError::InsufficientHistory {
                have: n_dates,
                need,
            });
        }

        let schedule = rebalance_indices(n_dates, &self.config);
        info!(
            rebalances = schedule.len(),
            training_window = self.config.training_window,
            "starting walk-forward backtest"
        );

        let mut phase = Phase::AwaitingTrainingWindow;
        debug!(?phase, first_rebalance = ?schedule.first(), "warming up");
        let n_tickers = prices.n_tickers();
        // Row-per-date weight matrix in panel ticker order.
        let mut weights = vec![0.0; n_dates * n_tickers];

        let mut rebalance_dates = Vec::new();
        let mut allocations_by_date = BTreeMap::new();
        let mut robustness_by_date = BTreeMap::new();
        let mut observations = Vec::new();

        for (step, &idx) in schedule.iter().enumerate() {
            let date = prices.dates()[idx];
            phase = Phase::Scoring;
            debug!(step, %date, ?phase, "rebalance");

            let plan = match self.plan_rebalance(
                date, prices, volumes, benchmark, vol_index, universe, &mut phase,
            )? {
                Some(plan) => plan,
                None => {
                    warn!(%date, "no qualifying candidates, holding cash");
                    continue;
                }
            };

            phase = Phase::Holding;
            debug!(%date, ?phase, positions = plan.weights.len(), "holding weights");
            let hold_end = schedule
                .get(step + 1)
                .copied()
                .unwrap_or(n_dates)
                .min(n_dates);
            for (ticker, &w) in &plan.weights {
                if let Some(t) = prices.ticker_index(ticker) {
                    for d in idx..hold_end {
                        weights[d * n_tickers + t] = w;
                    }
                    let entry = prices.get(idx, t);
                    let exit = prices.get(hold_end - 1, t);
                    if entry > 0.0 && entry.is_finite() && exit.is_finite() {
                        observations.push(Observation {
                            date,
                            ticker: ticker.clone(),
                            robustness: plan.robustness.get(ticker).copied().unwrap_or(0.0),
                            forward_return: exit / entry - 1.0,
                            weight: w,
                        });
                    }
                }
            }

            rebalance_dates.push(date);
            allocations_by_date.insert(date, plan.weights);
            robustness_by_date.insert(date, plan.robustness);
        }

        phase = Phase::Complete;
        let result = self.settle(
            prices, benchmark, &weights, rebalance_dates, allocations_by_date,
            robustness_by_date, observations, phase,
        );
        info!(
            total_return = result.metrics.total_return,
            sharpe = result.metrics.sharpe,
            "walk-forward backtest complete"
        );
        Ok(result)
    }

    /// Score, filter, size, and allocate one rebalance from training data only.
    #[allow(clippy::too_many_arguments)]
    fn plan_rebalance(
        &self,
        date: NaiveDate,
        prices: &Panel,
        volumes: &Panel,
        benchmark: &Series,
        vol_index: Option<&Series>,
        universe: &[String],
        phase: &mut Phase,
    ) -> Result<Option<RebalancePlan>, BacktestError> {
        let window = self.config.training_window;
        let train_prices = tail_window(&prices.truncate_before(date), window);
        let train_volumes = tail_window(&volumes.truncate_before(date), window);
        let train_benchmark = benchmark.truncate_before(date);
        let train_vol_index = vol_index.map(|v| v.truncate_before(date));

        let engine = ScoringEngine::new(self.config.scoring.clone());
        let inputs = ScoringInputs {
            prices: &train_prices,
            volumes: &train_volumes,
            benchmark: &train_benchmark,
            vol_index: train_vol_index.as_ref(),
            fundamentals: None,
            balance_sheets: None,
            earnings_quality: None,
        };
        let results = engine
            .score_universe(&inputs, universe)
            .map_err(|source| BacktestError::Scoring { date, source })?;

        let mut candidates: Vec<_> = results
            .into_iter()
            .filter(|r| {
                r.passed_safety_filters
                    && r.regime_robustness.unwrap_or(0.0) >= self.config.min_robustness
            })
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }
        candidates.sort_by(|a, b| b.fss_score.total_cmp(&a.fss_score));
        candidates.truncate(self.config.top_n);

        *phase = Phase::Allocating;
        let train_returns = train_prices.pct_change(1);
        let allocator_inputs: Vec<TickerInputs> = candidates
            .iter()
            .map(|r| {
                let t = train_prices
                    .ticker_index(&r.ticker)
                    .expect("candidates come from the scored panel");
                let returns: Vec<f64> = train_returns
                    .column(t)
                    .into_iter()
                    .filter(|v| v.is_finite())
                    .collect();
                let kelly = self.config.kelly.compute(&r.ticker, &returns);
                TickerInputs {
                    ticker: r.ticker.clone(),
                    kelly_fraction: kelly.kelly_fraction,
                    fss_score: r.fss_score,
                    robustness: r.regime_robustness.unwrap_or(0.0),
                    volatility: annualized_vol_or_default(&returns),
                }
            })
            .collect();

        let allocator = PortfolioAllocator::new(self.config.allocator.clone());
        let allocation = allocator
            .allocate(&allocator_inputs, &train_returns, self.config.method)
            .map_err(|source| BacktestError::Allocation { date, source })?;
        for warning in &allocation.warnings {
            debug!(%date, warning, "allocator warning");
        }

        let robustness = candidates
            .iter()
            .map(|r| (r.ticker.clone(), r.regime_robustness.unwrap_or(0.0)))
            .collect();
        Ok(Some(RebalancePlan {
            weights: allocation.weights,
            robustness,
        }))
    }

    /// Turn the held weight matrix into net daily returns and the equity curve.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        prices: &Panel,
        benchmark: &Series,
        weights: &[f64],
        rebalance_dates: Vec<NaiveDate>,
        allocations_by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
        robustness_by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
        observations: Vec<Observation>,
        final_phase: Phase,
    ) -> BacktestResult {
        let n_dates = prices.n_dates();
        let n_tickers = prices.n_tickers();
        let daily = prices.pct_change(1);
        let cost_rate = self.config.transaction_cost_bps / 10_000.0;

        let mut equity = Vec::with_capacity(n_dates);
        equity.push(self.config.initial_capital);
        let mut turnover_sum = 0.0;
        let mut position_days = 0usize;
        let mut position_count_sum = 0usize;

        for d in 1..n_dates {
            // Yesterday's weights earn today's returns.
            let mut gross = 0.0;
            let mut turnover = 0.0;
            let mut positions = 0usize;
            for t in 0..n_tickers {
                let w_prev = weights[(d - 1) * n_tickers + t];
                let w_now = weights[d * n_tickers + t];
                let r = daily.get(d, t);
                if w_prev > 0.0 && r.is_finite() {
                    gross += w_prev * r;
                }
                turnover += (w_now - w_prev).abs();
                if w_now > 0.0 {
                    positions += 1;
                }
            }
            let net = gross - turnover * cost_rate;
            equity.push(equity[d - 1] * (1.0 + net));
            turnover_sum += turnover;
            if positions > 0 {
                position_days += 1;
                position_count_sum += positions;
            }
        }

        let metrics = PerformanceMetrics::compute(
            &equity,
            Some(benchmark.values()),
            self.config.allocator.risk_free_rate,
        );
        let robustness_summary = RobustnessSummary::from_observations(&observations);

        BacktestResult {
            dates: prices.dates().to_vec(),
            drawdown: drawdown_series(&equity),
            equity_curve: equity,
            metrics,
            rebalance_dates,
            allocations_by_date,
            robustness_by_date,
            observations,
            robustness_summary,
            avg_turnover: turnover_sum / (n_dates - 1) as f64,
            avg_position_count: if position_days > 0 {
                position_count_sum as f64 / position_days as f64
            } else {
                0.0
            },
            final_phase,
        }
    }
}

/// Last `window` rows of a panel, or the whole panel if shorter.
fn tail_window(panel: &Panel, window: usize) -> Panel {
    let n = panel.n_dates();
    panel.slice_rows(n.saturating_sub(window), n)
}

/// Annualized volatility of daily returns, defaulting to 20% on thin history.
fn annualized_vol_or_default(returns: &[f64]) -> f64 {
    if returns.len() > 20 {
        stats::std_pop(returns) * 252.0_f64.sqrt()
    } else {
        0.20
    }
}
