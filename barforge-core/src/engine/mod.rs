//! The simulation engine: configuration, fills, gates, ledger,
//! action processing, and the bar loop.

pub mod accounting;
pub mod actions;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod fill;
pub mod gates;
pub mod ledger;

pub use accounting::{Accounting, CURRENCY_DP};
pub use config::{
    CommissionMode, EngineConfig, ExecutionConfig, FilterConfig, RiskConfig, SessionWindow,
    SlippageModel, TraceConfig,
};
pub use error::EngineError;
pub use event_loop::{run_backtest, RunResult};
pub use fill::apply_fill;
pub use gates::{evaluate_filters, risk_allows_entry, GateReason};
pub use ledger::{PositionLedger, SlTpHit};
