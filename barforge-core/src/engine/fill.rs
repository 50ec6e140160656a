//! Fill model: spread and slippage applied to an intended price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::Direction;
use crate::engine::config::{ExecutionConfig, SlippageModel};

/// Convert an intended (mid) price into an executed price.
///
/// Half the configured spread is added to BUY fills and subtracted from
/// SELL fills. Slippage is then added on top for both sides: FIXED adds
/// `slippage_value` ticks, PERCENTAGE adds `slippage_value` percent of
/// the spread-adjusted price. The default config passes the price
/// through unchanged.
///
/// This is a same-bar model — the fill lands on the bar that produced
/// the intent, with no latency deferral.
pub fn apply_fill(
    direction: Direction,
    intended_price: Decimal,
    cfg: &ExecutionConfig,
    tick_size: Decimal,
) -> Decimal {
    let mut fill_price = intended_price;

    if cfg.spread_units > Decimal::ZERO {
        let half_spread = cfg.spread_units * tick_size / dec!(2);
        match direction {
            Direction::Buy => fill_price += half_spread,
            Direction::Sell => fill_price -= half_spread,
        }
    }

    match cfg.slippage_model {
        SlippageModel::None => {}
        SlippageModel::Fixed => {
            fill_price += cfg.slippage_value * tick_size;
        }
        SlippageModel::Percentage => {
            fill_price += fill_price * cfg.slippage_value / dec!(100);
        }
    }

    fill_price
}
