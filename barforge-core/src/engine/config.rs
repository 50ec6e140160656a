//! Run configuration: execution costs, entry gates, tracing.
//!
//! All config types are immutable for the duration of a run and
//! serde-deserializable so hosts can supply them from TOML/JSON.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// How slippage is computed on top of the spread-adjusted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlippageModel {
    #[default]
    None,
    /// `slippage_value` ticks.
    Fixed,
    /// `slippage_value` percent of the fill price.
    Percentage,
}

/// How commission is charged on closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionMode {
    #[default]
    None,
    /// Flat `commission_per_unit` once per closure.
    PerTrade,
    /// `commission_per_unit` per lot of closed volume.
    PerLot,
}

/// Execution cost model applied to every simulated fill and closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Full spread in ticks; half is charged on each side of the mid.
    pub spread_units: Decimal,
    pub slippage_model: SlippageModel,
    pub slippage_value: Decimal,
    pub commission_mode: CommissionMode,
    pub commission_per_unit: Decimal,
}

impl Default for ExecutionConfig {
    /// Frictionless: fills pass through at the intended price and
    /// closures pay no commission.
    fn default() -> Self {
        Self {
            spread_units: Decimal::ZERO,
            slippage_model: SlippageModel::None,
            slippage_value: Decimal::ZERO,
            commission_mode: CommissionMode::None,
            commission_per_unit: Decimal::ZERO,
        }
    }
}

/// One intraday trading window, inclusive start / exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl SessionWindow {
    /// Parse a `"HH:MM"`/`"HH:MM"` pair.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: NaiveTime::parse_from_str(start, "%H:%M").ok()?,
            end: NaiveTime::parse_from_str(end, "%H:%M").ok()?,
        })
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// Serde helper for `"HH:MM"` session bounds.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// Session/day eligibility filters. Empty config ⇒ every bar eligible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Allowed weekdays, Monday = 0 through Sunday = 6.
    pub allowed_days_of_week: Option<Vec<u8>>,
    pub allowed_sessions: Option<Vec<SessionWindow>>,
}

/// Pre-trade risk limits applied to new entries only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_open_positions: Option<usize>,
    /// Block entries once equity has dropped more than this percentage
    /// from the start-of-day baseline.
    pub daily_loss_pct: Option<Decimal>,
    /// Reward:risk multiple used to derive a take-profit when an entry
    /// supplies a stop-loss but no target. Falls back to 2.0.
    pub default_rr: Option<Decimal>,
}

impl RiskConfig {
    pub fn rr_fallback(&self) -> Decimal {
        self.default_rr.unwrap_or(dec!(2.0))
    }
}

/// Decision trace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Hard cap on in-memory atoms; further atoms are silently dropped
    /// and the report's `truncated` flag is set once.
    pub max_atoms: usize,
    /// Record the once-per-bar filter verdict only every N bars.
    /// Event atoms (risk blocks, fills, lifecycle) are always recorded.
    pub sample_every: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_atoms: 100_000,
            sample_every: 1,
        }
    }
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_equity: Decimal,
    /// Minimum price increment. Must be positive.
    pub tick_size: Decimal,
    /// Account-currency value of one tick for one unit of volume.
    pub tick_value: Decimal,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub trace: Option<TraceConfig>,
}

impl EngineConfig {
    pub fn new(initial_equity: Decimal, tick_size: Decimal, tick_value: Decimal) -> Self {
        Self {
            initial_equity,
            tick_size,
            tick_value,
            execution: ExecutionConfig::default(),
            filters: FilterConfig::default(),
            risk: RiskConfig::default(),
            trace: None,
        }
    }
}
