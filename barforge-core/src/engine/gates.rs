//! Entry gates: session/day eligibility and pre-trade risk permission.
//!
//! Both evaluators are pure — they read state and return a verdict, with
//! no side effects. Gates apply to new entries only; exits always bypass
//! them.

use chrono::{Datelike, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::EquityPoint;
use crate::engine::config::{FilterConfig, RiskConfig};

/// Why an entry was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateReason {
    DayOfWeekDisallowed(Weekday),
    OutsideTradingSession,
    MaxOpenPositions,
    DailyLossPct,
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateReason::DayOfWeekDisallowed(day) => {
                write!(f, "day_of_week_disallowed_{}", day_name(*day))
            }
            GateReason::OutsideTradingSession => write!(f, "outside_trading_session"),
            GateReason::MaxOpenPositions => write!(f, "max_open_positions"),
            GateReason::DailyLossPct => write!(f, "daily_loss_pct"),
        }
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Session/day eligibility for a bar. `None` means the bar is eligible.
///
/// Day numbers follow Monday = 0. Sessions are inclusive-start,
/// exclusive-end on the bar's naive time-of-day. An empty day or session
/// list disables the corresponding check.
pub fn evaluate_filters(ts: NaiveDateTime, filters: &FilterConfig) -> Option<GateReason> {
    if let Some(days) = &filters.allowed_days_of_week {
        if !days.is_empty() {
            let weekday = ts.weekday();
            let day_index = weekday.num_days_from_monday() as u8;
            if !days.contains(&day_index) {
                return Some(GateReason::DayOfWeekDisallowed(weekday));
            }
        }
    }

    if let Some(sessions) = &filters.allowed_sessions {
        if !sessions.is_empty() {
            let time_of_day = ts.time();
            let in_session = sessions.iter().any(|w| w.contains(time_of_day));
            if !in_session {
                return Some(GateReason::OutsideTradingSession);
            }
        }
    }

    None
}

/// Risk permission for a new entry. `None` means the entry is allowed.
///
/// The daily-loss baseline is the last equity point whose naive date is
/// strictly before the bar's date, or `initial_equity` when no such
/// point exists. The drop is measured from that baseline to the latest
/// recorded point.
pub fn risk_allows_entry(
    open_positions: usize,
    equity_curve: &[EquityPoint],
    ts: NaiveDateTime,
    risk: &RiskConfig,
    initial_equity: Decimal,
) -> Option<GateReason> {
    if let Some(max_open) = risk.max_open_positions {
        if open_positions >= max_open {
            return Some(GateReason::MaxOpenPositions);
        }
    }

    if let Some(daily_loss_pct) = risk.daily_loss_pct {
        let today = ts.date();
        let day_start_equity = equity_curve
            .iter()
            .rev()
            .find(|p| p.timestamp.date() < today)
            .map(|p| p.equity)
            .unwrap_or(initial_equity);
        let current_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_equity);

        if day_start_equity != Decimal::ZERO {
            let pnl_pct = (current_equity - day_start_equity) / day_start_equity * dec!(100);
            if pnl_pct < -daily_loss_pct {
                return Some(GateReason::DailyLossPct);
            }
        }
    }

    None
}
