//! Barforge Runner — orchestration around the core engine.
//!
//! Loads bars from CSV, builds runs from TOML configs, computes
//! performance statistics, exports artifacts, and persists the decision
//! trace through a batched store.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod strategies;
pub mod trace_store;

pub use config::{ConfigError, RunConfig, StrategyConfig};
pub use data_loader::{load_bars_csv, LoadError};
pub use export::{export_report_json, import_report_json, save_artifacts};
pub use metrics::PerformanceStats;
pub use runner::{run_from_config, run_single_backtest, BacktestReport, RunOutput, RunnerError};
pub use trace_store::{persist_trace, JsonLinesTraceStore, MemoryTraceStore, TraceStore};
