//! Open positions and their identifiers.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::action::Direction;

/// Opaque, run-unique position identifier.
///
/// Ids are handed out sequentially by the ledger so that two runs over
/// identical inputs produce identical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pos-{}", self.0)
    }
}

/// An open position, owned exclusively by the ledger.
///
/// Mutated in place by reductions (volume decreases) and SL/TP
/// modifications; removed from the open set once volume reaches zero or
/// the position is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub direction: Direction,
    pub volume: Decimal,
    pub intended_price: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub entry_timestamp: NaiveDateTime,
    pub tag: Option<String>,
}
