//! EquityPoint — one sample of the account equity curve.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A `(timestamp, equity)` pair.
///
/// The curve holds one point per processed bar, plus an initial point
/// before the loop and a final point after forced end-of-run closures.
/// Points are appended in bar order and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: Decimal,
}
