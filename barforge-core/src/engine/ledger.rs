//! Position ledger — the open-position set and SL/TP resolution.
//!
//! Hit detection is a two-pass affair: `sl_tp_hits` scans the open set
//! and returns close decisions without touching it; the caller then
//! applies closures by id. This keeps the scan free of
//! mutate-while-iterating hazards.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::{Bar, ClosureReason, Direction, Position, PositionId, SideFilter};

/// A close decision produced by SL/TP resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SlTpHit {
    pub position_id: PositionId,
    pub exit_price: Decimal,
    pub reason: ClosureReason,
}

/// Owns every open position for the run. Positions keep their opening
/// order, which is also the FIFO order for reductions.
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: Vec<Position>,
    next_id: u64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly filled position and return its id.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        direction: Direction,
        volume: Decimal,
        intended_price: Decimal,
        entry_price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        entry_timestamp: NaiveDateTime,
        tag: Option<String>,
    ) -> PositionId {
        self.next_id += 1;
        let id = PositionId(self.next_id);
        self.positions.push(Position {
            id,
            direction,
            volume,
            intended_price,
            entry_price,
            stop_loss,
            take_profit,
            entry_timestamp,
            tag,
        });
        id
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| p.id == id)
    }

    /// Ids of open positions matching `side`, in opening (FIFO) order.
    pub fn matching_ids(&self, side: SideFilter) -> Vec<PositionId> {
        self.positions
            .iter()
            .filter(|p| side.matches(p.direction))
            .map(|p| p.id)
            .collect()
    }

    /// Remove a position from the open set and return it.
    pub fn take(&mut self, id: PositionId) -> Option<Position> {
        let idx = self.positions.iter().position(|p| p.id == id)?;
        Some(self.positions.remove(idx))
    }

    /// Remove and return every open position, preserving opening order.
    pub fn drain_all(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.positions)
    }

    /// Resolve stop-loss / take-profit triggers against one bar.
    ///
    /// For each position the stop is checked first and short-circuits
    /// the target check, so a bar whose range satisfies both always
    /// closes at the stop — the conservative tie-break. Longs: SL when
    /// `low ≤ sl`, TP when `high ≥ tp`. Shorts: SL when `high ≥ sl`,
    /// TP when `low ≤ tp`.
    pub fn sl_tp_hits(&self, bar: &Bar) -> Vec<SlTpHit> {
        let mut hits = Vec::new();
        for pos in &self.positions {
            let hit = match pos.direction {
                Direction::Buy => {
                    if pos.stop_loss.is_some_and(|sl| bar.low <= sl) {
                        pos.stop_loss.map(|sl| (sl, ClosureReason::SlHit))
                    } else if pos.take_profit.is_some_and(|tp| bar.high >= tp) {
                        pos.take_profit.map(|tp| (tp, ClosureReason::TpHit))
                    } else {
                        None
                    }
                }
                Direction::Sell => {
                    if pos.stop_loss.is_some_and(|sl| bar.high >= sl) {
                        pos.stop_loss.map(|sl| (sl, ClosureReason::SlHit))
                    } else if pos.take_profit.is_some_and(|tp| bar.low <= tp) {
                        pos.take_profit.map(|tp| (tp, ClosureReason::TpHit))
                    } else {
                        None
                    }
                }
            };
            if let Some((exit_price, reason)) = hit {
                hits.push(SlTpHit {
                    position_id: pos.id,
                    exit_price,
                    reason,
                });
            }
        }
        hits
    }
}
