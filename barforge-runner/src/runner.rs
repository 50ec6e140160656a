//! Backtest runner — wires together data, config, engine, and metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use barforge_core::domain::{Bar, ClosedTrade, EquityPoint};
use barforge_core::engine::{run_backtest, EngineConfig, EngineError};
use barforge_core::fingerprint::RunFingerprint;
use barforge_core::strategy::Strategy;
use barforge_core::trace::TraceReport;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::LoadError;
use crate::metrics::PerformanceStats;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Serializable result of one run: everything reporting needs, minus
/// the raw trace (which goes through the batched store instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    pub strategy: String,
    pub stats: PerformanceStats,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
    pub bar_count: usize,
    /// `Some(true)` when tracing was on and the atom cap was hit.
    pub trace_truncated: Option<bool>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A finished run: the report plus the detached trace.
#[derive(Debug)]
pub struct RunOutput {
    pub report: BacktestReport,
    pub trace: Option<TraceReport>,
}

/// Run a backtest over pre-loaded bars with an explicit strategy.
pub fn run_single_backtest(
    bars: &[Bar],
    strategy: &mut dyn Strategy,
    engine_config: &EngineConfig,
    symbol: &str,
) -> Result<RunOutput, RunnerError> {
    let fingerprint = RunFingerprint::compute(engine_config, bars);
    let run_id = fingerprint.run_id();
    info!(%run_id, symbol, strategy = strategy.name(), bars = bars.len(), "run starting");

    let strategy_name = strategy.name().to_string();
    let result = run_backtest(bars, strategy, engine_config)?;
    let stats = PerformanceStats::from_result(&result, engine_config.initial_equity);
    let trace_truncated = result.trace.as_ref().map(|t| t.truncated);

    Ok(RunOutput {
        report: BacktestReport {
            schema_version: SCHEMA_VERSION,
            run_id,
            symbol: symbol.to_string(),
            strategy: strategy_name,
            stats,
            equity_curve: result.equity_curve,
            trades: result.trades,
            bar_count: result.bar_count,
            trace_truncated,
        },
        trace: result.trace,
    })
}

/// Run from a `RunConfig`: builds the strategy and engine config, then
/// delegates to `run_single_backtest`.
pub fn run_from_config(config: &RunConfig, bars: &[Bar]) -> Result<RunOutput, RunnerError> {
    let engine_config = config.engine_config();
    let mut strategy = config.build_strategy();
    run_single_backtest(bars, strategy.as_mut(), &engine_config, &config.run.symbol)
}
