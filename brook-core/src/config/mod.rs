pub mod constants;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use constants::{DEFAULT_FEE_BPS, START_DEPOSIT};

/// Run parameters for a simulated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Cash the account starts with, in minor currency units.
    #[serde(default = "default_deposit")]
    pub start_deposit: i64,

    /// Transaction fee applied to both sides, in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,

    /// Stop the run after this many simulated seconds, independent of
    /// scenario length. `None` runs until the scenario is exhausted.
    #[serde(default)]
    pub max_seconds: Option<u64>,
}

fn default_deposit() -> i64 {
    START_DEPOSIT
}

fn default_fee_bps() -> u32 {
    DEFAULT_FEE_BPS
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_deposit: START_DEPOSIT,
            fee_bps: DEFAULT_FEE_BPS,
            max_seconds: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: SimConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.start_deposit, START_DEPOSIT);
        assert_eq!(config.fee_bps, DEFAULT_FEE_BPS);
        assert_eq!(config.max_seconds, None);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(f, r#"{{"fee_bps": 0, "max_seconds": 300}}"#).unwrap();

        let config = SimConfig::from_json_file(&path).unwrap();
        assert_eq!(config.fee_bps, 0);
        assert_eq!(config.max_seconds, Some(300));
        assert_eq!(config.start_deposit, START_DEPOSIT);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(SimConfig::from_json_file("/nonexistent/sim.json").is_err());
    }
}
