//! Action processor — interprets strategy actions against the ledger.
//!
//! Entry actions must pass both the session/day filter and the risk
//! gate. Close, reduce, and modify actions bypass both gates: an exit is
//! never blocked by entry rules.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::domain::{
    Action, Bar, ClosedTrade, ClosureReason, Direction, SideFilter, TradeStatus,
};
use crate::engine::accounting::{close_position, commission, gross_pnl, Accounting};
use crate::engine::config::EngineConfig;
use crate::engine::fill::apply_fill;
use crate::engine::gates::{risk_allows_entry, GateReason};
use crate::engine::ledger::PositionLedger;
use crate::trace::{Section, TraceCollector};

fn record(
    trace: &mut Option<TraceCollector>,
    section: Section,
    kind: &str,
    payload: serde_json::Value,
    ts: chrono::NaiveDateTime,
) {
    if let Some(collector) = trace {
        collector.record(section, kind, payload, ts);
    }
}

/// Process one bar's actions in the order the strategy returned them.
pub fn process_actions(
    actions: Vec<Action>,
    bar: &Bar,
    ledger: &mut PositionLedger,
    accounting: &mut Accounting,
    config: &EngineConfig,
    filter_block: Option<GateReason>,
    trace: &mut Option<TraceCollector>,
) {
    for action in actions {
        match action {
            Action::OpenTrade {
                direction,
                qty,
                sl,
                tp,
                tag,
                rr_ratio,
            } => open_trade(
                direction,
                qty,
                sl,
                tp,
                tag,
                rr_ratio,
                bar,
                ledger,
                accounting,
                config,
                filter_block,
                trace,
            ),
            Action::ClosePosition { side, qty: _, tag } => {
                // The simulator always closes matched positions in full;
                // partial exits go through ReducePosition.
                handle_close(side, tag, bar, ledger, accounting, config, trace);
            }
            Action::ReducePosition {
                direction,
                qty,
                tag: _,
            } => handle_reduce(direction, qty, bar, ledger, accounting, config, trace),
            Action::ModifySlTp { side, sl, tp } => handle_modify(side, sl, tp, ledger),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn open_trade(
    direction: Direction,
    qty: Decimal,
    sl: Option<Decimal>,
    tp: Option<Decimal>,
    tag: Option<String>,
    rr_ratio: Option<Decimal>,
    bar: &Bar,
    ledger: &mut PositionLedger,
    accounting: &mut Accounting,
    config: &EngineConfig,
    filter_block: Option<GateReason>,
    trace: &mut Option<TraceCollector>,
) {
    if let Some(reason) = filter_block {
        info!(%reason, "entry skipped by filter");
        record(
            trace,
            Section::Filter,
            "entry_blocked",
            json!({ "reason": reason.to_string() }),
            bar.timestamp,
        );
        return;
    }

    // Risk gates apply to new entries only.
    if let Some(reason) = risk_allows_entry(
        ledger.len(),
        &accounting.equity_curve,
        bar.timestamp,
        &config.risk,
        config.initial_equity,
    ) {
        info!(%reason, "entry skipped by risk guard");
        record(
            trace,
            Section::Risk,
            "blocked",
            json!({ "reason": reason.to_string() }),
            bar.timestamp,
        );
        return;
    }

    // Entry at the bar's close, treated as the mid price.
    let intended_price = bar.close;
    let fill_price = apply_fill(direction, intended_price, &config.execution, config.tick_size);

    // Derive a take-profit from the reward:risk multiple when only a
    // stop was supplied.
    let take_profit = match (tp, sl) {
        (Some(target), _) => Some(target),
        (None, Some(stop)) => {
            let rr = rr_ratio.unwrap_or_else(|| config.risk.rr_fallback());
            let sl_distance = (fill_price - stop).abs();
            Some(match direction {
                Direction::Buy => fill_price + rr * sl_distance,
                Direction::Sell => fill_price - rr * sl_distance,
            })
        }
        (None, None) => None,
    };

    let id = ledger.open(
        direction,
        qty,
        intended_price,
        fill_price,
        sl,
        take_profit,
        bar.timestamp,
        tag,
    );
    info!(%id, %direction, volume = %qty, entry = %fill_price, intended = %intended_price, "sim open");
    record(
        trace,
        Section::Fill,
        "entry",
        json!({
            "pos_id": id.to_string(),
            "direction": direction.to_string(),
            "volume": qty,
            "fill_price": fill_price,
        }),
        bar.timestamp,
    );
}

fn handle_close(
    side: SideFilter,
    tag: Option<String>,
    bar: &Bar,
    ledger: &mut PositionLedger,
    accounting: &mut Accounting,
    config: &EngineConfig,
    trace: &mut Option<TraceCollector>,
) {
    let reason = match tag {
        Some(tag) => ClosureReason::Custom(tag),
        None => ClosureReason::StrategyExit,
    };
    for id in ledger.matching_ids(side) {
        let Some(pos) = ledger.take(id) else { continue };
        let fill_price = apply_fill(pos.direction, bar.close, &config.execution, config.tick_size);
        let trade = close_position(
            &pos,
            fill_price,
            bar.timestamp,
            reason.clone(),
            &config.execution,
            config.tick_size,
            config.tick_value,
        );
        info!(%id, direction = %pos.direction, exit = %fill_price, pnl = %trade.pnl, reason = %trade.closure_reason, "sim close");
        record(
            trace,
            Section::Fill,
            "exit",
            json!({
                "pos_id": id.to_string(),
                "fill_price": fill_price,
                "reason": trade.closure_reason.to_string(),
            }),
            bar.timestamp,
        );
        accounting.record_trade(trade);
    }
}

fn handle_reduce(
    direction: Direction,
    qty: Decimal,
    bar: &Bar,
    ledger: &mut PositionLedger,
    accounting: &mut Accounting,
    config: &EngineConfig,
    trace: &mut Option<TraceCollector>,
) {
    let mut remaining = qty;
    // Oldest positions absorb the reduction first.
    for id in ledger.matching_ids(SideFilter::from(direction)) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let fill_price = apply_fill(direction, bar.close, &config.execution, config.tick_size);
        let Some(pos) = ledger.position_mut(id) else { continue };

        let reduce_now = pos.volume.min(remaining);
        let gross = gross_pnl(
            direction,
            pos.entry_price,
            fill_price,
            reduce_now,
            config.tick_size,
            config.tick_value,
        );
        let net = gross - commission(&config.execution, reduce_now);

        pos.volume -= reduce_now;
        let trade = ClosedTrade {
            position_id: pos.id,
            direction: pos.direction,
            volume: pos.volume,
            entry_price: pos.entry_price,
            entry_timestamp: pos.entry_timestamp,
            tag: pos.tag.clone(),
            exit_price: fill_price,
            exit_timestamp: bar.timestamp,
            pnl: net,
            closure_reason: ClosureReason::ReduceSignal,
            status: TradeStatus::PartialClose,
            reduced_volume: Some(reduce_now),
        };
        let emptied = pos.volume <= Decimal::ZERO;
        info!(%id, %direction, reduced = %reduce_now, remaining = %trade.volume, pnl = %net, "sim reduce");
        record(
            trace,
            Section::Fill,
            "reduce",
            json!({
                "pos_id": id.to_string(),
                "reduced_volume": reduce_now,
                "fill_price": fill_price,
            }),
            bar.timestamp,
        );
        accounting.record_trade(trade);

        if emptied {
            ledger.take(id);
        }
        remaining -= reduce_now;
    }
}

fn handle_modify(
    side: SideFilter,
    sl: Option<Decimal>,
    tp: Option<Decimal>,
    ledger: &mut PositionLedger,
) {
    for id in ledger.matching_ids(side) {
        let Some(pos) = ledger.position_mut(id) else { continue };
        if let Some(stop) = sl {
            pos.stop_loss = Some(stop);
        }
        if let Some(target) = tp {
            pos.take_profit = Some(target);
        }
        info!(%id, stop_loss = ?pos.stop_loss, take_profit = ?pos.take_profit, "sim modify sl/tp");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar_at(close: Decimal) -> Bar {
        Bar {
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1000),
        }
    }

    fn setup(config: &EngineConfig) -> (PositionLedger, Accounting) {
        (PositionLedger::new(), Accounting::new(config.initial_equity))
    }

    fn config() -> EngineConfig {
        EngineConfig::new(dec!(10000), dec!(0.0001), dec!(1))
    }

    fn open(direction: Direction, qty: Decimal, sl: Option<Decimal>, tp: Option<Decimal>) -> Action {
        Action::open_trade(direction, qty, sl, tp, None, None).unwrap()
    }

    #[test]
    fn open_trade_creates_position_at_close() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        process_actions(
            vec![open(Direction::Buy, dec!(1), None, None)],
            &bar_at(dec!(1.2000)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.positions()[0].entry_price, dec!(1.2000));
    }

    #[test]
    fn filter_block_suppresses_entry_only() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        ledger.open(
            Direction::Buy,
            dec!(1),
            dec!(1.2),
            dec!(1.2),
            None,
            None,
            bar_at(dec!(1.2)).timestamp,
            None,
        );
        process_actions(
            vec![
                open(Direction::Buy, dec!(1), None, None),
                Action::close_position(SideFilter::Any, crate::domain::CloseQty::All, None)
                    .unwrap(),
            ],
            &bar_at(dec!(1.2050)),
            &mut ledger,
            &mut accounting,
            &config,
            Some(GateReason::OutsideTradingSession),
            &mut None,
        );
        // Entry blocked, but the exit went through regardless.
        assert_eq!(ledger.len(), 0);
        assert_eq!(accounting.trades.len(), 1);
        assert_eq!(
            accounting.trades[0].closure_reason,
            ClosureReason::StrategyExit
        );
    }

    #[test]
    fn risk_block_max_open_positions() {
        let mut config = config();
        config.risk.max_open_positions = Some(1);
        let (mut ledger, mut accounting) = setup(&config);
        let bar = bar_at(dec!(1.2));
        process_actions(
            vec![
                open(Direction::Buy, dec!(1), None, None),
                open(Direction::Buy, dec!(1), None, None),
            ],
            &bar,
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn tp_derived_from_rr_when_missing() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        // entry 1.2000, sl 1.1950 → distance 0.0050, default rr 2.0 → tp 1.2100
        process_actions(
            vec![open(Direction::Buy, dec!(1), Some(dec!(1.1950)), None)],
            &bar_at(dec!(1.2000)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.positions()[0].take_profit, Some(dec!(1.2100)));

        // Sell side is signed the other way.
        process_actions(
            vec![open(Direction::Sell, dec!(1), Some(dec!(1.2050)), None)],
            &bar_at(dec!(1.2000)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.positions()[1].take_profit, Some(dec!(1.1900)));
    }

    #[test]
    fn explicit_rr_overrides_default() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        let action = Action::open_trade(
            Direction::Buy,
            dec!(1),
            Some(dec!(1.1950)),
            None,
            None,
            Some(dec!(3)),
        )
        .unwrap();
        process_actions(
            vec![action],
            &bar_at(dec!(1.2000)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.positions()[0].take_profit, Some(dec!(1.2150)));
    }

    #[test]
    fn close_matches_side() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        let bar = bar_at(dec!(1.2));
        process_actions(
            vec![
                open(Direction::Buy, dec!(1), None, None),
                open(Direction::Sell, dec!(1), None, None),
                Action::close_position(SideFilter::Buy, crate::domain::CloseQty::All, None)
                    .unwrap(),
            ],
            &bar,
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.positions()[0].direction, Direction::Sell);
    }

    #[test]
    fn close_tag_becomes_custom_reason() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        let bar = bar_at(dec!(1.2));
        process_actions(
            vec![
                open(Direction::Buy, dec!(1), None, None),
                Action::close_position(
                    SideFilter::Any,
                    crate::domain::CloseQty::All,
                    Some("session_end".into()),
                )
                .unwrap(),
            ],
            &bar,
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(
            accounting.trades[0].closure_reason,
            ClosureReason::Custom("session_end".into())
        );
    }

    #[test]
    fn reduce_consumes_fifo_across_positions() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        let bar = bar_at(dec!(1.2));
        process_actions(
            vec![
                open(Direction::Buy, dec!(1.0), None, None),
                open(Direction::Buy, dec!(0.5), None, None),
                Action::reduce_position(Direction::Buy, dec!(1.2), None).unwrap(),
            ],
            &bar,
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        // First position fully consumed (1.0), second reduced by 0.2.
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.positions()[0].volume, dec!(0.3));
        let partials: Vec<Decimal> = accounting
            .trades
            .iter()
            .filter(|t| t.status == TradeStatus::PartialClose)
            .map(|t| t.reduced_volume.unwrap())
            .collect();
        assert_eq!(partials, vec![dec!(1.0), dec!(0.2)]);
    }

    #[test]
    fn reduce_realizes_proportional_pnl() {
        let mut config = config();
        config.tick_size = dec!(0.0001);
        config.tick_value = dec!(1);
        let (mut ledger, mut accounting) = setup(&config);
        ledger.open(
            Direction::Buy,
            dec!(2),
            dec!(1.2000),
            dec!(1.2000),
            None,
            None,
            bar_at(dec!(1.2)).timestamp,
            None,
        );
        // Close half at +10 ticks: 10 * $1 * 1.0 = $10
        process_actions(
            vec![Action::reduce_position(Direction::Buy, dec!(1), None).unwrap()],
            &bar_at(dec!(1.2010)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(accounting.trades[0].pnl, dec!(10));
        assert_eq!(ledger.positions()[0].volume, dec!(1));
    }

    #[test]
    fn modify_overwrites_only_provided_fields() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        ledger.open(
            Direction::Buy,
            dec!(1),
            dec!(1.2),
            dec!(1.2),
            Some(dec!(1.19)),
            Some(dec!(1.22)),
            bar_at(dec!(1.2)).timestamp,
            None,
        );
        process_actions(
            vec![Action::modify_sl_tp(SideFilter::Any, Some(dec!(1.195)), None).unwrap()],
            &bar_at(dec!(1.2)),
            &mut ledger,
            &mut accounting,
            &config,
            None,
            &mut None,
        );
        assert_eq!(ledger.positions()[0].stop_loss, Some(dec!(1.195)));
        assert_eq!(ledger.positions()[0].take_profit, Some(dec!(1.22)));
    }

    #[test]
    fn blocked_entry_records_trace_atom() {
        let config = config();
        let (mut ledger, mut accounting) = setup(&config);
        let mut trace = Some(TraceCollector::new(Default::default()));
        process_actions(
            vec![open(Direction::Buy, dec!(1), None, None)],
            &bar_at(dec!(1.2)),
            &mut ledger,
            &mut accounting,
            &config,
            Some(GateReason::OutsideTradingSession),
            &mut trace,
        );
        let report = trace.unwrap().into_report();
        assert_eq!(report.atoms.len(), 1);
        assert_eq!(report.atoms[0].section, Section::Filter);
        assert_eq!(report.atoms[0].kind, "entry_blocked");
        assert_eq!(
            report.atoms[0].payload["reason"],
            "outside_trading_session"
        );
    }
}
