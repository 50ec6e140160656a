//! Serializable run configuration (TOML).
//!
//! A `RunConfig` captures everything needed to reproduce a backtest:
//! the instrument's tick geometry, execution costs, entry gates, trace
//! settings, and the strategy with its parameters.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use barforge_core::engine::{
    EngineConfig, ExecutionConfig, FilterConfig, RiskConfig, TraceConfig,
};
use barforge_core::strategy::Strategy;

use crate::strategies::{BuyAndHold, EmaCrossover};

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub trace: Option<TraceConfig>,
    pub strategy: StrategyConfig,
}

/// Instrument and account basics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    pub symbol: String,
    pub initial_equity: Decimal,
    pub tick_size: Decimal,
    pub tick_value: Decimal,
}

/// Strategy selection with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    EmaCrossover {
        fast_period: usize,
        slow_period: usize,
        qty: Decimal,
        /// Stop distance from entry, in ticks.
        #[serde(default = "default_stop_ticks")]
        stop_ticks: Decimal,
    },
    BuyAndHold {
        qty: Decimal,
    },
}

fn default_stop_ticks() -> Decimal {
    dec!(100)
}

impl RunConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// The engine-facing slice of this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_equity: self.run.initial_equity,
            tick_size: self.run.tick_size,
            tick_value: self.run.tick_value,
            execution: self.execution.clone(),
            filters: self.filters.clone(),
            risk: self.risk.clone(),
            trace: self.trace.clone(),
        }
    }

    /// Instantiate the configured strategy.
    pub fn build_strategy(&self) -> Box<dyn Strategy> {
        match &self.strategy {
            StrategyConfig::EmaCrossover {
                fast_period,
                slow_period,
                qty,
                stop_ticks,
            } => Box::new(EmaCrossover::new(
                *fast_period,
                *slow_period,
                *qty,
                *stop_ticks,
                self.run.tick_size,
            )),
            StrategyConfig::BuyAndHold { qty } => Box::new(BuyAndHold::new(*qty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barforge_core::engine::{CommissionMode, SlippageModel};

    const SAMPLE: &str = r#"
        [run]
        symbol = "EURUSD"
        initial_equity = "10000"
        tick_size = "0.0001"
        tick_value = "1.0"

        [execution]
        spread_units = "2"
        slippage_model = "FIXED"
        slippage_value = "1"
        commission_mode = "PER_LOT"
        commission_per_unit = "0.5"

        [filters]
        allowed_days_of_week = [0, 1, 2, 3, 4]
        allowed_sessions = [{ start = "08:00", end = "17:00" }]

        [risk]
        max_open_positions = 3
        daily_loss_pct = "2.5"

        [trace]
        max_atoms = 5000
        sample_every = 10

        [strategy]
        type = "EMA_CROSSOVER"
        fast_period = 12
        slow_period = 26
        qty = "1.0"
    "#;

    #[test]
    fn parses_full_config() {
        let config: RunConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.run.symbol, "EURUSD");
        assert_eq!(config.execution.slippage_model, SlippageModel::Fixed);
        assert_eq!(config.execution.commission_mode, CommissionMode::PerLot);
        assert_eq!(config.risk.max_open_positions, Some(3));
        assert_eq!(config.trace.as_ref().unwrap().sample_every, 10);
        match &config.strategy {
            StrategyConfig::EmaCrossover {
                fast_period,
                slow_period,
                stop_ticks,
                ..
            } => {
                assert_eq!((*fast_period, *slow_period), (12, 26));
                assert_eq!(*stop_ticks, dec!(100)); // default
            }
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            [run]
            symbol = "SPY"
            initial_equity = "100000"
            tick_size = "0.01"
            tick_value = "0.01"

            [strategy]
            type = "BUY_AND_HOLD"
            qty = "100"
        "#,
        )
        .unwrap();
        assert_eq!(config.execution, ExecutionConfig::default());
        assert!(config.trace.is_none());
        let engine = config.engine_config();
        assert_eq!(engine.initial_equity, dec!(100000));
    }

    #[test]
    fn engine_config_mirrors_sections() {
        let config: RunConfig = toml::from_str(SAMPLE).unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.execution, config.execution);
        assert_eq!(engine.filters, config.filters);
        assert_eq!(engine.risk, config.risk);
        assert_eq!(engine.trace, config.trace);
    }
}
