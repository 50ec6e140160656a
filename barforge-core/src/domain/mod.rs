//! Domain types: bars, actions, positions, trades, equity points.

pub mod action;
pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use action::{Action, ActionError, CloseQty, Direction, SideFilter};
pub use bar::Bar;
pub use equity::EquityPoint;
pub use position::{Position, PositionId};
pub use trade::{ClosedTrade, ClosureReason, TradeStatus};
