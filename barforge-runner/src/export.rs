//! Artifact export — JSON report, CSV equity curve and trade tape,
//! JSON-lines trace.
//!
//! All persisted reports carry a `schema_version`; unknown (newer)
//! versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use barforge_core::domain::{ClosedTrade, EquityPoint};

use crate::runner::{BacktestReport, RunOutput, SCHEMA_VERSION};
use crate::trace_store::{persist_trace, JsonLinesTraceStore};

/// Atoms per trace batch when writing artifacts.
const TRACE_BATCH_SIZE: usize = 500;

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_report_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_report_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Equity curve as CSV: `timestamp,equity`.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for point in curve {
        wtr.write_record([point.timestamp.to_string(), point.equity.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade tape as CSV, one row per closure record.
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "position_id",
        "direction",
        "volume",
        "entry_price",
        "entry_timestamp",
        "exit_price",
        "exit_timestamp",
        "pnl",
        "closure_reason",
        "status",
        "reduced_volume",
        "tag",
    ])?;
    for t in trades {
        wtr.write_record([
            t.position_id.to_string(),
            t.direction.to_string(),
            t.volume.to_string(),
            t.entry_price.to_string(),
            t.entry_timestamp.to_string(),
            t.exit_price.to_string(),
            t.exit_timestamp.to_string(),
            t.pnl.to_string(),
            t.closure_reason.to_string(),
            format!("{:?}", t.status),
            t.reduced_volume.map(|v| v.to_string()).unwrap_or_default(),
            t.tag.clone().unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `equity.csv`, `trades.csv`, and (when tracing
/// was on) `trace.jsonl` into `dir`. Returns the paths written.
pub fn save_artifacts(dir: &Path, output: &RunOutput) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create artifact dir '{}'", dir.display()))?;
    let mut written = Vec::new();

    let report_path = dir.join("report.json");
    std::fs::write(&report_path, export_report_json(&output.report)?)?;
    written.push(report_path);

    let equity_path = dir.join("equity.csv");
    std::fs::write(&equity_path, export_equity_csv(&output.report.equity_curve)?)?;
    written.push(equity_path);

    let trades_path = dir.join("trades.csv");
    std::fs::write(&trades_path, export_trades_csv(&output.report.trades)?)?;
    written.push(trades_path);

    if let Some(trace) = &output.trace {
        let trace_path = dir.join("trace.jsonl");
        let mut store = JsonLinesTraceStore::create(&trace_path)
            .with_context(|| format!("failed to create '{}'", trace_path.display()))?;
        persist_trace(&mut store, trace, TRACE_BATCH_SIZE)
            .context("trace persistence failed")?;
        written.push(trace_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceStats;
    use rust_decimal_macros::dec;

    fn sample_report() -> BacktestReport {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        BacktestReport {
            schema_version: SCHEMA_VERSION,
            run_id: "abc123".into(),
            symbol: "EURUSD".into(),
            strategy: "buy_and_hold".into(),
            stats: PerformanceStats {
                initial_equity: dec!(10000),
                final_equity: dec!(10020),
                net_profit: dec!(20),
                total_trades: 1,
                winning_trades: 1,
                losing_trades: 0,
                win_rate: 1.0,
                profit_factor: 0.0,
                max_drawdown: 0.0,
            },
            equity_curve: vec![EquityPoint {
                timestamp: ts,
                equity: dec!(10000.00),
            }],
            trades: vec![],
            bar_count: 1,
            trace_truncated: None,
        }
    }

    #[test]
    fn report_json_roundtrip() {
        let report = sample_report();
        let json = export_report_json(&report).unwrap();
        let back = import_report_json(&json).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.stats, report.stats);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&report).unwrap();
        assert!(import_report_json(&json).is_err());
    }

    #[test]
    fn equity_csv_has_header_and_rows() {
        let report = sample_report();
        let csv = export_equity_csv(&report.equity_curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,equity");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",10000.00"));
    }

    #[test]
    fn save_artifacts_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let output = RunOutput {
            report: sample_report(),
            trace: None,
        };
        let written = save_artifacts(dir.path(), &output).unwrap();
        assert_eq!(written.len(), 3);
        for path in written {
            assert!(path.exists());
        }
    }
}
