//! Injectable score cache.
//!
//! The engine itself is stateless; callers that score the same universe
//! repeatedly can plug in a cache keyed by ticker, date, and a hash of the
//! scoring configuration, so a config change can never serve stale scores.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;

use crate::scoring::{ScoreResult, ScoringConfig};

/// Cache key: one ticker on one date under one exact configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub date: NaiveDate,
    pub config_hash: [u8; 32],
}

impl CacheKey {
    pub fn new(ticker: &str, date: NaiveDate, config: &ScoringConfig) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            config_hash: hash_config(config),
        }
    }
}

/// Blake3 over the canonical JSON form of the configuration.
fn hash_config<T: Serialize>(config: &T) -> [u8; 32] {
    let bytes = serde_json::to_vec(config).unwrap_or_default();
    *blake3::hash(&bytes).as_bytes()
}

pub trait ScoreCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<ScoreResult>;
    fn put(&self, key: CacheKey, result: ScoreResult);
}

/// Cache that never hits. The default collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ScoreCache for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<ScoreResult> {
        None
    }

    fn put(&self, _key: CacheKey, _result: ScoreResult) {}
}

/// Unbounded in-process cache behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, ScoreResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut m) = self.entries.lock() {
            m.clear();
        }
    }
}

impl ScoreCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<ScoreResult> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: CacheKey, result: ScoreResult) {
        if let Ok(mut m) = self.entries.lock() {
            m.insert(key, result);
        }
    }
}
