//! Decision trace — a capped, sampled buffer of per-bar decision atoms.
//!
//! The collector is an explicit buffer threaded through the simulation
//! loop by mutable reference; nothing else holds onto it during a run.
//! Atoms past the configured cap are silently dropped, with a one-time
//! truncation flag (and a single warning) so the simulation itself is
//! never affected by trace volume.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::engine::config::TraceConfig;

/// Which engine stage produced an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Filter,
    Risk,
    Fill,
    Engine,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Filter => write!(f, "filter"),
            Section::Risk => write!(f, "risk"),
            Section::Fill => write!(f, "fill"),
            Section::Engine => write!(f, "engine"),
        }
    }
}

/// One recorded decision/event.
///
/// `idx` is the atom's 1-based sequence number within its bar, so a
/// store can reconstruct ordering even when writes are chunked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceAtom {
    pub section: Section,
    pub kind: String,
    pub payload: Value,
    pub ts: NaiveDateTime,
    pub bar_index: usize,
    pub idx: u32,
}

/// The finished trace handed to the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    pub atoms: Vec<TraceAtom>,
    /// Set once when the cap was hit and atoms were dropped.
    pub truncated: bool,
}

/// Append-only atom buffer with a row cap and per-bar sampling.
#[derive(Debug)]
pub struct TraceCollector {
    config: TraceConfig,
    atoms: Vec<TraceAtom>,
    truncated: bool,
    bar_index: usize,
    next_idx: u32,
}

impl TraceCollector {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            atoms: Vec::new(),
            truncated: false,
            bar_index: 0,
            next_idx: 1,
        }
    }

    /// Reset the per-bar sequence counter for a new bar.
    pub fn begin_bar(&mut self, bar_index: usize) {
        self.bar_index = bar_index;
        self.next_idx = 1;
    }

    /// Whether once-per-bar routine atoms should be recorded for the
    /// current bar. Event atoms ignore sampling.
    pub fn sampled(&self) -> bool {
        self.config.sample_every <= 1 || self.bar_index % self.config.sample_every as usize == 0
    }

    /// Record one atom, dropping it silently once the cap is reached.
    pub fn record(&mut self, section: Section, kind: &str, payload: Value, ts: NaiveDateTime) {
        if self.atoms.len() >= self.config.max_atoms {
            if !self.truncated {
                warn!(
                    max_atoms = self.config.max_atoms,
                    "trace capacity reached, dropping further atoms"
                );
                self.truncated = true;
            }
            return;
        }
        self.atoms.push(TraceAtom {
            section,
            kind: kind.to_string(),
            payload,
            ts,
            bar_index: self.bar_index,
            idx: self.next_idx,
        });
        self.next_idx += 1;
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_report(self) -> TraceReport {
        TraceReport {
            atoms: self.atoms,
            truncated: self.truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn idx_restarts_per_bar() {
        let mut collector = TraceCollector::new(TraceConfig::default());
        collector.begin_bar(0);
        collector.record(Section::Filter, "result", json!({"eligible": true}), ts());
        collector.record(Section::Risk, "blocked", json!({"reason": "x"}), ts());
        collector.begin_bar(1);
        collector.record(Section::Fill, "entry", json!({"pos_id": "pos-1"}), ts());

        let report = collector.into_report();
        assert_eq!(report.atoms[0].idx, 1);
        assert_eq!(report.atoms[1].idx, 2);
        assert_eq!(report.atoms[2].idx, 1);
        assert_eq!(report.atoms[2].bar_index, 1);
        assert!(!report.truncated);
    }

    #[test]
    fn cap_drops_silently_and_flags_once() {
        let mut collector = TraceCollector::new(TraceConfig {
            max_atoms: 2,
            sample_every: 1,
        });
        collector.begin_bar(0);
        for _ in 0..5 {
            collector.record(Section::Engine, "tick", Value::Null, ts());
        }
        assert_eq!(collector.len(), 2);
        assert!(collector.is_truncated());
        let report = collector.into_report();
        assert_eq!(report.atoms.len(), 2);
        assert!(report.truncated);
    }

    #[test]
    fn sampling_gates_routine_bars() {
        let mut collector = TraceCollector::new(TraceConfig {
            max_atoms: 100,
            sample_every: 3,
        });
        let sampled: Vec<bool> = (0..7)
            .map(|i| {
                collector.begin_bar(i);
                collector.sampled()
            })
            .collect();
        assert_eq!(
            sampled,
            vec![true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn section_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Section::Filter).unwrap(), "\"filter\"");
        assert_eq!(Section::Engine.to_string(), "engine");
    }
}
