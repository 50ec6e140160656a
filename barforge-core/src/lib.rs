//! Barforge Core — deterministic bar-by-bar backtest execution engine.
//!
//! Given a price series and a strategy that emits trading actions, the
//! engine simulates order fills (spread + slippage), stop-loss /
//! take-profit resolution with a conservative stop-first tie-break,
//! partial position reduction, commission, and pre-trade session/risk
//! gating, producing an equity curve, a closed-trade ledger, and an
//! optional capped decision trace.
//!
//! The engine processes one instrument's bars against one account's
//! equity, strictly single-threaded: every bar's fills and trace
//! emissions are fully resolved before the next bar starts. All money
//! arithmetic is exact decimal — identical inputs produce identical
//! outputs, byte for byte.

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod strategy;
pub mod trace;

pub use domain::{Action, ActionError, Bar, ClosedTrade, Direction, EquityPoint};
pub use engine::{run_backtest, EngineConfig, EngineError, RunResult};
pub use strategy::{Strategy, StrategyError};
