//! Bar-by-bar simulation loop — the heart of the engine.
//!
//! Per-bar sequence:
//! 1. Resolve SL/TP triggers against the bar
//! 2. Evaluate the session/day filter (traced whether or not an entry
//!    is attempted)
//! 3. Call the strategy with the window ending at the bar
//! 4. Process the returned actions in order
//! 5. Append an equity point
//!
//! After the last bar, every remaining open position is force-closed at
//! the last close price and one final equity point is appended.
//!
//! The loop is strictly single-threaded and synchronous: a bar's fills
//! and trace emissions are fully resolved before the next bar starts.
//! Entries fill on the bar that produced them; a latency model that
//! defers accepted opens to the next bar would hook into step 4.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::domain::{Bar, ClosedTrade, ClosureReason, EquityPoint};
use crate::engine::accounting::{close_position, Accounting, CURRENCY_DP};
use crate::engine::actions::process_actions;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::gates::evaluate_filters;
use crate::engine::ledger::PositionLedger;
use crate::strategy::Strategy;
use crate::trace::{Section, TraceCollector, TraceReport};

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// One point per bar, plus the initial point and the final
    /// post-closure point.
    pub equity_curve: Vec<EquityPoint>,
    /// Full and partial closures, in the order they were realized.
    pub trades: Vec<ClosedTrade>,
    pub final_equity: Decimal,
    pub bar_count: usize,
    /// Present when tracing was configured.
    pub trace: Option<TraceReport>,
}

/// Run a backtest over a strictly time-ordered bar series.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &mut dyn Strategy,
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    let Some(last_bar) = bars.last() else {
        return Err(EngineError::NoBars);
    };
    if config.tick_size <= Decimal::ZERO {
        return Err(EngineError::InvalidTickSize(config.tick_size));
    }
    if config.tick_value <= Decimal::ZERO {
        return Err(EngineError::InvalidTickValue(config.tick_value));
    }

    let mut ledger = PositionLedger::new();
    let mut accounting = Accounting::new(config.initial_equity);
    let mut trace: Option<TraceCollector> = config.trace.clone().map(TraceCollector::new);

    info!(bars = bars.len(), strategy = strategy.name(), "backtest started");

    // Opening point, before any bar is processed.
    accounting.append_point(bars[0].timestamp);

    for (bar_index, bar) in bars.iter().enumerate() {
        if let Some(collector) = &mut trace {
            collector.begin_bar(bar_index);
        }

        // ─── 1. SL/TP resolution ───
        for hit in ledger.sl_tp_hits(bar) {
            let Some(pos) = ledger.take(hit.position_id) else { continue };
            let trade = close_position(
                &pos,
                hit.exit_price,
                bar.timestamp,
                hit.reason,
                &config.execution,
                config.tick_size,
                config.tick_value,
            );
            info!(
                id = %pos.id,
                direction = %pos.direction,
                exit = %hit.exit_price,
                pnl = %trade.pnl,
                reason = %trade.closure_reason,
                "sim close"
            );
            if let Some(collector) = &mut trace {
                collector.record(
                    Section::Fill,
                    "exit",
                    json!({
                        "pos_id": pos.id.to_string(),
                        "fill_price": hit.exit_price,
                        "reason": trade.closure_reason.to_string(),
                    }),
                    bar.timestamp,
                );
            }
            accounting.record_trade(trade);
        }

        // ─── 2. Filter gate ───
        let filter_block = evaluate_filters(bar.timestamp, &config.filters);
        if let Some(collector) = &mut trace {
            if collector.sampled() {
                collector.record(
                    Section::Filter,
                    "result",
                    json!({
                        "eligible": filter_block.is_none(),
                        "reason": filter_block.map(|r| r.to_string()),
                    }),
                    bar.timestamp,
                );
            }
        }

        // ─── 3. Strategy ───
        let window = &bars[..=bar_index];
        let actions = strategy
            .on_bar_close(window, accounting.equity())
            .map_err(|source| EngineError::Strategy { bar_index, source })?;

        // ─── 4. Actions ───
        if !actions.is_empty() {
            process_actions(
                actions,
                bar,
                &mut ledger,
                &mut accounting,
                config,
                filter_block,
                &mut trace,
            );
        }

        // ─── 5. Equity point ───
        accounting.append_point(bar.timestamp);
    }

    // ─── End of run: force-close the remainder ───
    let remaining = ledger.drain_all();
    if !remaining.is_empty() {
        info!(
            count = remaining.len(),
            "end of backtest, closing remaining open positions"
        );
    }
    for pos in remaining {
        let trade = close_position(
            &pos,
            last_bar.close,
            last_bar.timestamp,
            ClosureReason::EndOfBacktest,
            &config.execution,
            config.tick_size,
            config.tick_value,
        );
        if let Some(collector) = &mut trace {
            collector.record(
                Section::Engine,
                "force_close",
                json!({
                    "pos_id": pos.id.to_string(),
                    "fill_price": last_bar.close,
                }),
                last_bar.timestamp,
            );
        }
        accounting.record_trade(trade);
    }
    accounting.append_point(last_bar.timestamp);

    let final_equity = accounting.equity().round_dp(CURRENCY_DP);
    info!(%final_equity, trades = accounting.trades.len(), "backtest finished");

    Ok(RunResult {
        equity_curve: accounting.equity_curve,
        trades: accounting.trades,
        final_equity,
        bar_count: bars.len(),
        trace: trace.map(TraceCollector::into_report),
    })
}
