//! Reference strategies for the CLI and tests.
//!
//! The engine treats strategies as an external collaborator; these two
//! are deliberately small. `EmaCrossover` is the classic trend entry
//! with a tick-distance stop and an RR-derived target; `BuyAndHold`
//! opens once and lets the end-of-run closure flatten it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use barforge_core::domain::{Action, Bar, CloseQty, Direction, SideFilter};
use barforge_core::strategy::{Strategy, StrategyError};

/// EMA crossover:
/// - long when the fast EMA crosses above the slow EMA,
/// - short when it crosses below,
/// - an opposite cross flattens the standing position first.
///
/// Stops sit `stop_ticks` away from the entry; the take-profit is left
/// to the engine's reward:risk derivation.
#[derive(Debug, Clone)]
pub struct EmaCrossover {
    fast_period: usize,
    slow_period: usize,
    qty: Decimal,
    stop_ticks: Decimal,
    tick_size: Decimal,
}

impl EmaCrossover {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        qty: Decimal,
        stop_ticks: Decimal,
        tick_size: Decimal,
    ) -> Self {
        assert!(fast_period > 0, "fast_period must be > 0");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
            qty,
            stop_ticks,
            tick_size,
        }
    }

    fn ema(bars: &[Bar], period: usize) -> Option<Decimal> {
        if bars.len() < period {
            return None;
        }
        let alpha = dec!(2) / Decimal::from(period as u64 + 1);
        let mut ema = bars[0].close;
        for bar in &bars[1..] {
            ema = alpha * bar.close + (Decimal::ONE - alpha) * ema;
        }
        Some(ema)
    }

    /// `Some(true)` = bullish cross, `Some(false)` = bearish cross.
    fn detect_cross(&self, bars: &[Bar]) -> Option<bool> {
        if bars.len() < self.slow_period + 1 {
            return None;
        }
        let fast_now = Self::ema(bars, self.fast_period)?;
        let slow_now = Self::ema(bars, self.slow_period)?;
        let prev = &bars[..bars.len() - 1];
        let fast_prev = Self::ema(prev, self.fast_period)?;
        let slow_prev = Self::ema(prev, self.slow_period)?;

        if fast_prev <= slow_prev && fast_now > slow_now {
            Some(true)
        } else if fast_prev >= slow_prev && fast_now < slow_now {
            Some(false)
        } else {
            None
        }
    }

    fn entry(&self, direction: Direction, close: Decimal) -> Result<Vec<Action>, StrategyError> {
        let stop_distance = self.stop_ticks * self.tick_size;
        let (opposite, sl) = match direction {
            Direction::Buy => (SideFilter::Sell, close - stop_distance),
            Direction::Sell => (SideFilter::Buy, close + stop_distance),
        };
        Ok(vec![
            Action::close_position(opposite, CloseQty::All, None)?,
            Action::open_trade(direction, self.qty, Some(sl), None, Some("ema_cross".into()), None)?,
        ])
    }
}

impl Strategy for EmaCrossover {
    fn on_bar_close(
        &mut self,
        window: &[Bar],
        _equity: Decimal,
    ) -> Result<Vec<Action>, StrategyError> {
        let close = match window.last() {
            Some(bar) => bar.close,
            None => return Ok(Vec::new()),
        };
        match self.detect_cross(window) {
            Some(true) => self.entry(Direction::Buy, close),
            Some(false) => self.entry(Direction::Sell, close),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "ema_crossover"
    }
}

/// Opens one long on the first bar and never exits; the engine's forced
/// end-of-run closure realizes the result.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    qty: Decimal,
    opened: bool,
}

impl BuyAndHold {
    pub fn new(qty: Decimal) -> Self {
        Self { qty, opened: false }
    }
}

impl Strategy for BuyAndHold {
    fn on_bar_close(
        &mut self,
        _window: &[Bar],
        _equity: Decimal,
    ) -> Result<Vec<Action>, StrategyError> {
        if self.opened {
            return Ok(Vec::new());
        }
        self.opened = true;
        Ok(vec![Action::open_trade(
            Direction::Buy,
            self.qty,
            None,
            None,
            Some("buy_and_hold".into()),
            None,
        )?])
    }

    fn name(&self) -> &str {
        "buy_and_hold"
    }
}
