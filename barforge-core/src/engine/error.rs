//! Engine run errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::strategy::StrategyError;

/// A run either completes or fails hard with the triggering bar index
/// and cause — there is no partial or resumable run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot run a backtest over an empty bar series")]
    NoBars,

    #[error("tick_size must be positive, got {0}")]
    InvalidTickSize(Decimal),

    #[error("tick_value must be positive, got {0}")]
    InvalidTickValue(Decimal),

    #[error("strategy failed at bar {bar_index}: {source}")]
    Strategy {
        bar_index: usize,
        #[source]
        source: StrategyError,
    },
}
