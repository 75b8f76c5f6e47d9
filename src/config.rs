use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::LightError;

/// Main configuration structure for the traffic light
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrafficLightConfig {
    /// Phase timing
    pub cycle: CycleConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Vehicle simulation driven by the binary
    pub simulation: SimulationConfig,
}

// The config crate lowercases keys from files and the environment, so each
// camelCase option name also needs its lowercased spelling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Lower bound (inclusive) of the random phase duration
    #[serde(alias = "minCycleMs", alias = "mincyclems")]
    pub min_cycle_ms: u64,
    /// Upper bound (exclusive) of the random phase duration
    #[serde(alias = "maxCycleMs", alias = "maxcyclems")]
    pub max_cycle_ms: u64,
    /// Wake granularity of the cycle loop
    #[serde(alias = "pollIntervalMs", alias = "pollintervalms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of vehicles queued at the light
    pub vehicles: u32,
    /// Stop the simulation after this many seconds
    pub run_seconds: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_cycle_ms: 4000,
            max_cycle_ms: 6000,
            poll_interval_ms: 100,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicles: 3,
            run_seconds: 30,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), LightError> {
        if self.min_cycle_ms >= self.max_cycle_ms {
            return Err(LightError::InvalidConfig {
                reason: format!(
                    "min_cycle_ms ({}) must be below max_cycle_ms ({})",
                    self.min_cycle_ms, self.max_cycle_ms
                ),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(LightError::InvalidConfig {
                reason: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_cycle(&self) -> Duration {
        Duration::from_millis(self.max_cycle_ms)
    }
}

impl TrafficLightConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (traffic-light.toml)
    /// 3. Environment variables (prefixed with TRAFFIC_LIGHT_, `__` between levels)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("traffic-light.toml").exists() {
            builder = builder.add_source(File::with_name("traffic-light"));
        }

        builder = builder.add_source(
            Environment::with_prefix("TRAFFIC_LIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let traffic_light_config: TrafficLightConfig = config.try_deserialize()?;
        traffic_light_config.cycle.validate()?;

        Ok(traffic_light_config)
    }

    /// Load from an explicit file, ignoring the environment
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let traffic_light_config: TrafficLightConfig = config.try_deserialize()?;
        traffic_light_config.cycle.validate()?;
        Ok(traffic_light_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
