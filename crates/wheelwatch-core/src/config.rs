use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::spin::WheelVariant;

/// Top-level configuration, parsed from one or more layered TOML files.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WheelwatchConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl WheelwatchConfig {
    /// Load config from a TOML file path.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and merge multiple TOML files (later files override earlier).
    pub fn from_toml_files(paths: &[&Path]) -> Result<Self, ConfigError> {
        if paths.is_empty() {
            return Err(ConfigError::Parse("no config files provided".into()));
        }

        let mut base = toml::Value::Table(toml::map::Map::new());
        for path in paths {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let overlay: toml::Value =
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            merge_toml(&mut base, overlay);
        }

        let merged_str = toml::to_string(&base).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_toml_str(&merged_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.priority_threshold < 1 {
            return Err(ConfigError::Invalid("tracker.priority_threshold must be >= 1".into()));
        }
        let sim = &self.simulation;
        if !(sim.initial_bankroll > 0.0) {
            return Err(ConfigError::Invalid("simulation.initial_bankroll must be > 0".into()));
        }
        if !(sim.base_bet > 0.0) {
            return Err(ConfigError::Invalid("simulation.base_bet must be > 0".into()));
        }
        if sim.stop_loss < 0.0 || sim.take_profit < 0.0 {
            return Err(ConfigError::Invalid(
                "simulation.stop_loss and take_profit must be >= 0".into(),
            ));
        }
        if sim.generated_spins == 0 {
            return Err(ConfigError::Invalid("simulation.generated_spins must be > 0".into()));
        }
        Ok(())
    }
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) = (base, overlay) {
        for (key, value) in overlay_table {
            if let Some(base_value) = base_table.get_mut(&key) {
                if base_value.is_table() && value.is_table() {
                    merge_toml(base_value, value);
                    continue;
                }
            }
            base_table.insert(key, value);
        }
    }
}

/// Settings read by every matching-engine call.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Loss streak length that turns a strategy into a priority.
    #[serde(default = "default_3")]
    pub priority_threshold: u32,
    #[serde(default)]
    pub wheel: WheelVariant,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            priority_threshold: 3,
            wheel: WheelVariant::European,
        }
    }
}

/// Bet-sizing rule applied after each outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StakingSystem {
    #[default]
    Flat,
    Martingale,
    #[serde(rename = "dalembert")]
    DAlembert,
    Fibonacci,
    Labouchere,
}

impl fmt::Display for StakingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StakingSystem::Flat => "flat",
            StakingSystem::Martingale => "martingale",
            StakingSystem::DAlembert => "dalembert",
            StakingSystem::Fibonacci => "fibonacci",
            StakingSystem::Labouchere => "labouchere",
        };
        f.write_str(name)
    }
}

impl FromStr for StakingSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['\'', '-', '_'], "").as_str() {
            "flat" => Ok(StakingSystem::Flat),
            "martingale" => Ok(StakingSystem::Martingale),
            "dalembert" => Ok(StakingSystem::DAlembert),
            "fibonacci" => Ok(StakingSystem::Fibonacci),
            "labouchere" => Ok(StakingSystem::Labouchere),
            other => Err(format!("unknown staking system: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_1000")]
    pub initial_bankroll: f64,
    #[serde(default = "default_10")]
    pub base_bet: f64,
    #[serde(default)]
    pub system: StakingSystem,
    /// 0 disables the stop-loss.
    #[serde(default)]
    pub stop_loss: f64,
    /// 0 disables the take-profit.
    #[serde(default)]
    pub take_profit: f64,
    #[serde(default = "default_1000_usize")]
    pub generated_spins: usize,
    #[serde(default = "default_42")]
    pub seed: u64,
    /// Synthetic sequences in a Monte Carlo run.
    #[serde(default = "default_1000_usize")]
    pub runs: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_bankroll: 1000.0,
            base_bet: 10.0,
            system: StakingSystem::Flat,
            stop_loss: 0.0,
            take_profit: 0.0,
            generated_spins: 1000,
            seed: 42,
            runs: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// Default value helpers
fn default_3() -> u32 { 3 }
fn default_10() -> f64 { 10.0 }
fn default_1000() -> f64 { 1000.0 }
fn default_1000_usize() -> usize { 1000 }
fn default_42() -> u64 { 42 }
fn default_data_dir() -> PathBuf { PathBuf::from(".wheelwatch") }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[tracker]
priority_threshold = 5
wheel = "american"

[simulation]
system = "dalembert"
base_bet = 2.5
"#;

        let config = WheelwatchConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.tracker.priority_threshold, 5);
        assert_eq!(config.tracker.wheel, WheelVariant::American);
        assert_eq!(config.simulation.system, StakingSystem::DAlembert);
        assert!((config.simulation.base_bet - 2.5).abs() < 1e-10);
        // untouched fields keep their defaults
        assert!((config.simulation.initial_bankroll - 1000.0).abs() < 1e-10);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.storage.data_dir, PathBuf::from(".wheelwatch"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = WheelwatchConfig::from_toml_str("").unwrap();
        assert_eq!(config.tracker.priority_threshold, 3);
        assert_eq!(config.tracker.wheel, WheelVariant::European);
        assert_eq!(config.simulation.system, StakingSystem::Flat);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = WheelwatchConfig::from_toml_str("[tracker]\npriority_threshold = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_non_positive_bet_rejected() {
        let err = WheelwatchConfig::from_toml_str("[simulation]\nbase_bet = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(&base, "[tracker]\npriority_threshold = 4\n\n[simulation]\nseed = 7\n").unwrap();
        std::fs::write(&local, "[simulation]\nsystem = \"martingale\"\n").unwrap();

        let config = WheelwatchConfig::from_toml_files(&[&base, &local]).unwrap();
        assert_eq!(config.tracker.priority_threshold, 4);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.system, StakingSystem::Martingale);
    }

    #[test]
    fn test_staking_system_from_str() {
        assert_eq!("d'Alembert".parse::<StakingSystem>(), Ok(StakingSystem::DAlembert));
        assert_eq!("LABOUCHERE".parse::<StakingSystem>(), Ok(StakingSystem::Labouchere));
        assert!("paroli".parse::<StakingSystem>().is_err());
    }
}
