//! Analysis configuration
//!
//! Every tunable threshold of the pipelines lives here. Config is loaded with
//! a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/siaga/config/analysis.toml) when it exists
//! 2. The embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their compiled defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analysis.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub anomaly: AnomalyConfig,
    pub fraud: FraudConfig,
    pub compliance: ComplianceConfig,
    pub forecast: ForecastConfig,
    pub clustering: ClusteringConfig,
    pub habits: HabitsConfig,
    pub scenario: ScenarioConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { z_threshold: 2.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    pub static_threshold: f64,
    pub z_threshold: f64,
    pub dynamic_sigma: f64,
    pub min_transactions: usize,
    pub min_member_history: usize,
    pub rapid_fire_window_minutes: i64,
    pub rapid_fire_min_others: usize,
    pub round_number_min: f64,
    pub round_number_unit: f64,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            static_threshold: 10_000_000.0,
            z_threshold: 3.0,
            dynamic_sigma: 3.0,
            min_transactions: 3,
            min_member_history: 3,
            rapid_fire_window_minutes: 60,
            rapid_fire_min_others: 2,
            round_number_min: 500_000.0,
            round_number_unit: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    pub window_days: i64,
    pub non_compliant_below: f64,
    pub warning_below: f64,
    /// Credit given to an excused absence relative to attending
    pub excused_weight: f64,
    pub consecutive_absence_limit: usize,
    pub excused_fraction_limit: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            non_compliant_below: 0.75,
            warning_below: 0.85,
            excused_weight: 0.5,
            consecutive_absence_limit: 3,
            excused_fraction_limit: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub alpha: f64,
    pub beta: f64,
    /// Moving-average regression window
    pub window: usize,
    /// Weight of Holt's method in the blend; the moving average gets the rest
    pub holt_weight: f64,
    pub periods: usize,
    pub min_months: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            window: 3,
            holt_weight: 0.7,
            periods: 3,
            min_months: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Fixed seed for reproducible segmentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitsConfig {
    pub inactivity_days: i64,
    pub churn_risk_ratio: f64,
    pub retention_ratio: f64,
    pub retention_min_members: usize,
    pub meeting_peak_share: f64,
    pub persona_min_records: usize,
    pub persona_min_points: usize,
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            inactivity_days: 30,
            churn_risk_ratio: 0.2,
            retention_ratio: 0.1,
            retention_min_members: 5,
            meeting_peak_share: 0.3,
            persona_min_records: 5,
            persona_min_points: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Share of the running balance assumed to turn over each period
    pub turnover_ratio: f64,
    pub periods: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            turnover_ratio: 0.2,
            periods: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
        }
    }
}

impl AnalysisConfig {
    /// Load with override resolution (data dir override, then embedded)
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path, falling back to embedded defaults if it doesn't exist
    pub fn with_config_path(path: impl AsRef<Path>) -> Result<Self> {
        load_config(Some(path.as_ref()))
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be within [0, 1], got {}", name, v)))
            }
        };
        unit("forecast.alpha", self.forecast.alpha)?;
        unit("forecast.beta", self.forecast.beta)?;
        unit("forecast.holt_weight", self.forecast.holt_weight)?;
        unit("compliance.excused_weight", self.compliance.excused_weight)?;

        if self.clustering.k == 0 {
            return Err(Error::Config("clustering.k must be at least 1".into()));
        }
        if self.fraud.round_number_unit <= 0.0 {
            return Err(Error::Config("fraud.round_number_unit must be positive".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("siaga").join("config").join("analysis.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<AnalysisConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading analysis config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    AnalysisConfig::from_toml(&content)
}
