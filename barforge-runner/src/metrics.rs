//! Performance statistics computed from a finished run.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use barforge_core::engine::RunResult;

/// Headline statistics for a backtest run.
///
/// Money figures stay decimal; ratios are plain floats — they are
/// reporting values, not bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    pub net_profit: Decimal,
    /// Closure records, partial closes included.
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of profitable closure records (0.0 when no trades).
    pub win_rate: f64,
    /// Gross profit / gross loss. Infinite when there are profits and
    /// no losses; 0.0 when there are no profits.
    pub profit_factor: f64,
    /// Deepest peak-to-trough equity drop, as a fraction of the peak.
    pub max_drawdown: f64,
}

impl PerformanceStats {
    pub fn from_result(result: &RunResult, initial_equity: Decimal) -> Self {
        let net_profit = result.final_equity - initial_equity;

        let mut winning = 0usize;
        let mut losing = 0usize;
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        for trade in &result.trades {
            if trade.pnl > Decimal::ZERO {
                winning += 1;
                gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                losing += 1;
                gross_loss += -trade.pnl;
            }
        }

        let total = result.trades.len();
        let win_rate = if total > 0 {
            winning as f64 / total as f64
        } else {
            0.0
        };
        let profit_factor = if gross_loss > Decimal::ZERO {
            (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
        } else if gross_profit > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };

        Self {
            initial_equity,
            final_equity: result.final_equity,
            net_profit,
            total_trades: total,
            winning_trades: winning,
            losing_trades: losing,
            win_rate,
            profit_factor,
            max_drawdown: max_drawdown(result),
        }
    }
}

fn max_drawdown(result: &RunResult) -> f64 {
    let mut peak = Decimal::MIN;
    let mut worst = 0.0f64;
    for point in &result.equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > Decimal::ZERO {
            let dd = ((peak - point.equity) / peak).to_f64().unwrap_or(0.0);
            if dd > worst {
                worst = dd;
            }
        }
    }
    worst
}
