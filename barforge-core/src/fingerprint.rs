//! Run fingerprinting — content-addressed identity for a backtest.
//!
//! Two runs with the same configuration and the same bar series share a
//! fingerprint, which makes results cacheable and reruns verifiable.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::engine::config::EngineConfig;

/// Identity of one run: separate hashes for the configuration and the
/// dataset, so either side can be compared on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: String,
    pub dataset_hash: String,
}

impl RunFingerprint {
    pub fn compute(config: &EngineConfig, bars: &[Bar]) -> Self {
        Self {
            config_hash: hash_json(config),
            dataset_hash: hash_json(&bars),
        }
    }

    /// Combined short id, convenient for file names and log lines.
    pub fn run_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.config_hash.as_bytes());
        hasher.update(self.dataset_hash.as_bytes());
        hasher.finalize().to_hex()[..16].to_string()
    }
}

fn hash_json<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_vec(value).unwrap_or_default();
    blake3::hash(&json).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bars() -> Vec<Bar> {
        vec![Bar {
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            open: dec!(1.2),
            high: dec!(1.21),
            low: dec!(1.19),
            close: dec!(1.2),
            volume: dec!(1000),
        }]
    }

    #[test]
    fn identical_inputs_share_a_fingerprint() {
        let config = EngineConfig::new(dec!(10000), dec!(0.0001), dec!(1));
        let a = RunFingerprint::compute(&config, &bars());
        let b = RunFingerprint::compute(&config, &bars());
        assert_eq!(a, b);
        assert_eq!(a.run_id(), b.run_id());
    }

    #[test]
    fn config_change_changes_the_fingerprint() {
        let config = EngineConfig::new(dec!(10000), dec!(0.0001), dec!(1));
        let mut other = config.clone();
        other.initial_equity = dec!(20000);
        let a = RunFingerprint::compute(&config, &bars());
        let b = RunFingerprint::compute(&other, &bars());
        assert_ne!(a.config_hash, b.config_hash);
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert_ne!(a.run_id(), b.run_id());
    }
}
