//! ClosedTrade — the append-only record of a full or partial closure.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::position::{Position, PositionId};

/// Why a position (or part of one) was closed.
///
/// `Custom` carries the free-form tag of a strategy close action; the
/// remaining variants are the engine's own closure causes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureReason {
    SlHit,
    TpHit,
    StrategyExit,
    ReduceSignal,
    EndOfBacktest,
    Custom(String),
}

impl std::fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosureReason::SlHit => write!(f, "SL_HIT"),
            ClosureReason::TpHit => write!(f, "TP_HIT"),
            ClosureReason::StrategyExit => write!(f, "STRATEGY_EXIT"),
            ClosureReason::ReduceSignal => write!(f, "REDUCE_SIGNAL"),
            ClosureReason::EndOfBacktest => write!(f, "END_OF_BACKTEST"),
            ClosureReason::Custom(tag) => write!(f, "{tag}"),
        }
    }
}

/// Full closure vs. partial reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Closed,
    PartialClose,
}

/// Snapshot of a position at closure time, plus exit bookkeeping.
///
/// Immutable once appended to the trade log. For partial closes,
/// `volume` is the volume remaining on the open position after the cut
/// and `reduced_volume` is the amount realized by this record; for full
/// closes, `volume` is the closed volume and `reduced_volume` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub position_id: PositionId,
    pub direction: Direction,
    pub volume: Decimal,
    pub entry_price: Decimal,
    pub entry_timestamp: NaiveDateTime,
    pub tag: Option<String>,
    pub exit_price: Decimal,
    pub exit_timestamp: NaiveDateTime,
    /// Net PnL in account currency (commission already subtracted).
    pub pnl: Decimal,
    pub closure_reason: ClosureReason,
    pub status: TradeStatus,
    pub reduced_volume: Option<Decimal>,
}

impl ClosedTrade {
    /// Build a full-closure record from a position snapshot.
    pub fn full(
        pos: &Position,
        exit_price: Decimal,
        exit_timestamp: NaiveDateTime,
        pnl: Decimal,
        closure_reason: ClosureReason,
    ) -> Self {
        Self {
            position_id: pos.id,
            direction: pos.direction,
            volume: pos.volume,
            entry_price: pos.entry_price,
            entry_timestamp: pos.entry_timestamp,
            tag: pos.tag.clone(),
            exit_price,
            exit_timestamp,
            pnl,
            closure_reason,
            status: TradeStatus::Closed,
            reduced_volume: None,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn closure_reason_display_matches_wire_names() {
        assert_eq!(ClosureReason::SlHit.to_string(), "SL_HIT");
        assert_eq!(ClosureReason::TpHit.to_string(), "TP_HIT");
        assert_eq!(ClosureReason::StrategyExit.to_string(), "STRATEGY_EXIT");
        assert_eq!(ClosureReason::ReduceSignal.to_string(), "REDUCE_SIGNAL");
        assert_eq!(ClosureReason::EndOfBacktest.to_string(), "END_OF_BACKTEST");
        assert_eq!(
            ClosureReason::Custom("tp1_scaleout".into()).to_string(),
            "tp1_scaleout"
        );
    }

    #[test]
    fn winner_flag() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let pos = Position {
            id: PositionId(1),
            direction: Direction::Buy,
            volume: dec!(1),
            intended_price: dec!(100),
            entry_price: dec!(100),
            stop_loss: None,
            take_profit: None,
            entry_timestamp: ts,
            tag: None,
        };
        let trade = ClosedTrade::full(&pos, dec!(110), ts, dec!(10), ClosureReason::StrategyExit);
        assert!(trade.is_winner());
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.reduced_volume, None);
    }
}
