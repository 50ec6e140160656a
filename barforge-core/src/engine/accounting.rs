//! Money arithmetic and equity/trade bookkeeping.
//!
//! All PnL math is exact decimal arithmetic; the equity curve is rounded
//! to currency precision at append time so reruns are byte-identical.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::{ClosedTrade, Direction, EquityPoint};
use crate::engine::config::{CommissionMode, ExecutionConfig};

/// Decimal places of the account currency.
pub const CURRENCY_DP: u32 = 2;

/// Gross PnL in account currency for a closed quantity.
///
/// `(exit − entry)` for longs, `(entry − exit)` for shorts, converted to
/// ticks and scaled by tick value and volume. A non-positive tick size
/// yields zero rather than dividing by it.
pub fn gross_pnl(
    direction: Direction,
    entry_price: Decimal,
    exit_price: Decimal,
    volume: Decimal,
    tick_size: Decimal,
    tick_value: Decimal,
) -> Decimal {
    if tick_size <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let price_diff_ticks = match direction {
        Direction::Buy => (exit_price - entry_price) / tick_size,
        Direction::Sell => (entry_price - exit_price) / tick_size,
    };
    price_diff_ticks * tick_value * volume
}

/// Commission charged for closing `volume`.
pub fn commission(cfg: &ExecutionConfig, volume: Decimal) -> Decimal {
    match cfg.commission_mode {
        CommissionMode::None => Decimal::ZERO,
        CommissionMode::PerTrade => cfg.commission_per_unit,
        CommissionMode::PerLot => cfg.commission_per_unit * volume,
    }
}

/// Build the full-closure record for a position: gross PnL on the whole
/// volume, commission subtracted, snapshot appended-ready.
pub fn close_position(
    pos: &crate::domain::Position,
    exit_price: Decimal,
    exit_timestamp: NaiveDateTime,
    reason: crate::domain::ClosureReason,
    cfg: &ExecutionConfig,
    tick_size: Decimal,
    tick_value: Decimal,
) -> ClosedTrade {
    let gross = gross_pnl(
        pos.direction,
        pos.entry_price,
        exit_price,
        pos.volume,
        tick_size,
        tick_value,
    );
    let net = gross - commission(cfg, pos.volume);
    ClosedTrade::full(pos, exit_price, exit_timestamp, net, reason)
}

/// Running equity, the equity curve, and the closed-trade log.
#[derive(Debug, Clone)]
pub struct Accounting {
    initial_equity: Decimal,
    equity: Decimal,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
}

impl Accounting {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            equity: initial_equity,
            equity_curve: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// Realize a closed trade: equity moves by its net PnL and the
    /// record is appended to the log.
    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.equity += trade.pnl;
        self.trades.push(trade);
    }

    /// Append an equity point at currency precision.
    pub fn append_point(&mut self, timestamp: NaiveDateTime) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            equity: self.equity.round_dp(CURRENCY_DP),
        });
    }

    pub fn equity(&self) -> Decimal {
        self.equity
    }

    pub fn initial_equity(&self) -> Decimal {
        self.initial_equity
    }
}
