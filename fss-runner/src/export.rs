//! Backtest artifact export — JSON manifest plus CSV files.
//!
//! Three artifacts per run:
//! - **manifest.json**: the full `BacktestResult`, round-trippable
//! - **equity.csv**: date, equity, drawdown
//! - **observations.csv**: the robustness-vs-forward-return log

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::walk_forward::BacktestResult;

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

pub fn import_json(json: &str) -> Result<BacktestResult> {
    serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Equity curve as CSV with date, equity, and drawdown columns.
pub fn export_equity_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "drawdown"])?;
    for ((date, equity), drawdown) in result
        .dates
        .iter()
        .zip(result.equity_curve.iter())
        .zip(result.drawdown.iter())
    {
        wtr.write_record([
            &date.to_string(),
            &format!("{equity:.2}"),
            &format!("{drawdown:.6}"),
        ])?;
    }
    finish(wtr)
}

/// Observation log as CSV: one row per held position per rebalance.
pub fn export_observations_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "ticker", "robustness", "forward_return", "weight"])?;
    for o in &result.observations {
        wtr.write_record([
            &o.date.to_string(),
            &o.ticker,
            &format!("{:.6}", o.robustness),
            &format!("{:.6}", o.forward_return),
            &format!("{:.6}", o.weight),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run under `output_dir/<name>/`.
///
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path, name: &str) -> Result<PathBuf> {
    let run_dir = output_dir.join(name);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(result)?)?;
    std::fs::write(
        run_dir.join("observations.csv"),
        export_observations_csv(result)?,
    )?;

    Ok(run_dir)
}

/// Load a `BacktestResult` back from an artifact directory's manifest.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;
    use crate::walk_forward::{Observation, Phase, RobustnessSummary};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn fixture() -> BacktestResult {
        let dates: Vec<NaiveDate> = (0..3)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        let equity = vec![100_000.0, 101_000.0, 100_500.0];
        let observations = vec![Observation {
            date: dates[0],
            ticker: "AAPL".into(),
            robustness: 0.8,
            forward_return: 0.01,
            weight: 0.15,
        }];
        BacktestResult {
            drawdown: crate::metrics::drawdown_series(&equity),
            metrics: PerformanceMetrics::compute(&equity, None, 0.04),
            robustness_summary: RobustnessSummary::from_observations(&observations),
            dates,
            equity_curve: equity,
            rebalance_dates: vec![],
            allocations_by_date: BTreeMap::new(),
            robustness_by_date: BTreeMap::new(),
            observations,
            avg_turnover: 0.1,
            avg_position_count: 1.0,
            final_phase: Phase::Complete,
        }
    }

    #[test]
    fn json_roundtrip() {
        let result = fixture();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn equity_csv_has_one_row_per_date() {
        let csv = export_equity_csv(&fixture()).unwrap();
        let lines: Vec<&str> = csv.trim().lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "date,equity,drawdown");
        assert!(lines[1].starts_with("2024-01-02,100000.00,"));
    }

    #[test]
    fn observations_csv_lists_positions() {
        let csv = export_observations_csv(&fixture()).unwrap();
        assert!(csv.contains("AAPL"));
        assert!(csv.contains("0.800000"));
    }

    #[test]
    fn artifact_bundle_roundtrip() {
        let result = fixture();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&result, dir.path(), "smoke").unwrap();
        assert!(run_dir.join("manifest.json").exists());
        assert!(run_dir.join("equity.csv").exists());
        assert!(run_dir.join("observations.csv").exists());
        let back = load_artifacts(&run_dir).unwrap();
        assert_eq!(result, back);
    }
}
