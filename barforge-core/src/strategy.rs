//! Strategy collaborator contract.
//!
//! The engine calls `on_bar_close` once per bar with the immutable
//! window of bars up to and including the current one, plus the current
//! equity, and receives zero or more actions. How the strategy decides
//! is its own business; the engine only validates action shape — which
//! the `Action` constructors already guarantee.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Action, Bar};

/// A strategy failure. Not caught by the engine: the run aborts with the
/// failing bar index attached.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StrategyError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<crate::domain::ActionError> for StrategyError {
    fn from(err: crate::domain::ActionError) -> Self {
        StrategyError::with_source("invalid action", err)
    }
}

/// The decision-making collaborator driven by the simulation loop.
pub trait Strategy {
    /// React to the bar at the end of `window`, given current equity.
    fn on_bar_close(
        &mut self,
        window: &[Bar],
        equity: Decimal,
    ) -> Result<Vec<Action>, StrategyError>;

    /// Name used in logs and run fingerprints.
    fn name(&self) -> &str {
        "strategy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_error_carries_source() {
        let err = StrategyError::from(crate::domain::ActionError::EmptyModify);
        assert_eq!(err.to_string(), "invalid action");
        assert!(std::error::Error::source(&err).is_some());
    }
}
