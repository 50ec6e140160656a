//! Strategy-issued actions — a closed set of tagged variants.
//!
//! The engine never receives a malformed action: every variant is built
//! through a validating constructor, so shape errors surface at
//! construction time rather than inside the bar loop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a position or an entry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Side selector for close/modify actions: a specific direction or all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SideFilter {
    Buy,
    Sell,
    Any,
}

impl From<Direction> for SideFilter {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => SideFilter::Buy,
            Direction::Sell => SideFilter::Sell,
        }
    }
}

impl SideFilter {
    pub fn matches(&self, direction: Direction) -> bool {
        match self {
            SideFilter::Buy => direction == Direction::Buy,
            SideFilter::Sell => direction == Direction::Sell,
            SideFilter::Any => true,
        }
    }
}

/// Quantity selector for close actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloseQty {
    All,
    Exact(Decimal),
}

/// Errors from action construction.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("rr_ratio must be positive, got {0}")]
    NonPositiveRrRatio(Decimal),

    #[error("modify_sl_tp requires at least one of stop_loss / take_profit")]
    EmptyModify,
}

/// One trading action emitted by a strategy for the current bar.
///
/// Actions are transient: they are consumed within the bar they are
/// emitted and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    OpenTrade {
        direction: Direction,
        qty: Decimal,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
        tag: Option<String>,
        rr_ratio: Option<Decimal>,
    },
    ClosePosition {
        side: SideFilter,
        qty: CloseQty,
        tag: Option<String>,
    },
    ReducePosition {
        direction: Direction,
        qty: Decimal,
        tag: Option<String>,
    },
    ModifySlTp {
        side: SideFilter,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
    },
}

impl Action {
    /// Open a new position. `qty` must be positive; `rr_ratio`, when
    /// given, must be positive (it derives a take-profit when `tp` is
    /// absent and `sl` is present).
    pub fn open_trade(
        direction: Direction,
        qty: Decimal,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
        tag: Option<String>,
        rr_ratio: Option<Decimal>,
    ) -> Result<Self, ActionError> {
        if qty <= Decimal::ZERO {
            return Err(ActionError::NonPositiveQuantity(qty));
        }
        if let Some(rr) = rr_ratio {
            if rr <= Decimal::ZERO {
                return Err(ActionError::NonPositiveRrRatio(rr));
            }
        }
        Ok(Action::OpenTrade {
            direction,
            qty,
            sl,
            tp,
            tag,
            rr_ratio,
        })
    }

    /// Close matching positions in full.
    pub fn close_position(
        side: SideFilter,
        qty: CloseQty,
        tag: Option<String>,
    ) -> Result<Self, ActionError> {
        if let CloseQty::Exact(q) = qty {
            if q <= Decimal::ZERO {
                return Err(ActionError::NonPositiveQuantity(q));
            }
        }
        Ok(Action::ClosePosition { side, qty, tag })
    }

    /// Reduce matching positions by `qty`, oldest first.
    pub fn reduce_position(
        direction: Direction,
        qty: Decimal,
        tag: Option<String>,
    ) -> Result<Self, ActionError> {
        if qty <= Decimal::ZERO {
            return Err(ActionError::NonPositiveQuantity(qty));
        }
        Ok(Action::ReducePosition {
            direction,
            qty,
            tag,
        })
    }

    /// Overwrite stop-loss and/or take-profit on matching positions.
    /// At least one of the two must be provided.
    pub fn modify_sl_tp(
        side: SideFilter,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
    ) -> Result<Self, ActionError> {
        if sl.is_none() && tp.is_none() {
            return Err(ActionError::EmptyModify);
        }
        Ok(Action::ModifySlTp { side, sl, tp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn open_trade_rejects_non_positive_qty() {
        let err = Action::open_trade(Direction::Buy, dec!(0), None, None, None, None);
        assert_eq!(err, Err(ActionError::NonPositiveQuantity(dec!(0))));

        let err = Action::open_trade(Direction::Buy, dec!(-1), None, None, None, None);
        assert_eq!(err, Err(ActionError::NonPositiveQuantity(dec!(-1))));
    }

    #[test]
    fn open_trade_rejects_non_positive_rr() {
        let err = Action::open_trade(
            Direction::Sell,
            dec!(1),
            Some(dec!(1.21)),
            None,
            None,
            Some(dec!(0)),
        );
        assert_eq!(err, Err(ActionError::NonPositiveRrRatio(dec!(0))));
    }

    #[test]
    fn close_position_rejects_non_positive_exact_qty() {
        let err = Action::close_position(SideFilter::Any, CloseQty::Exact(dec!(-0.5)), None);
        assert_eq!(err, Err(ActionError::NonPositiveQuantity(dec!(-0.5))));
    }

    #[test]
    fn modify_requires_sl_or_tp() {
        let err = Action::modify_sl_tp(SideFilter::Any, None, None);
        assert_eq!(err, Err(ActionError::EmptyModify));

        assert!(Action::modify_sl_tp(SideFilter::Buy, Some(dec!(1.19)), None).is_ok());
    }

    #[test]
    fn side_filter_matching() {
        assert!(SideFilter::Any.matches(Direction::Buy));
        assert!(SideFilter::Any.matches(Direction::Sell));
        assert!(SideFilter::Buy.matches(Direction::Buy));
        assert!(!SideFilter::Buy.matches(Direction::Sell));
        assert!(!SideFilter::Sell.matches(Direction::Buy));
    }

    #[test]
    fn action_serialization_roundtrip() {
        let action = Action::open_trade(
            Direction::Buy,
            dec!(1.5),
            Some(dec!(1.19)),
            None,
            Some("breakout".into()),
            Some(dec!(2.0)),
        )
        .unwrap();
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"OPEN_TRADE\""));
        let deser: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, deser);
    }
}
