//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV sample for a fixed time interval.
///
/// Timestamps are timezone-naive: session windows and the daily-loss
/// baseline compare naive times/dates, never UTC offsets. The series fed
/// to the engine is assumed strictly time-ordered with no duplicate
/// timestamps; that is an upstream contract, not validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > Decimal::ZERO
            && self.close > Decimal::ZERO
    }
}
