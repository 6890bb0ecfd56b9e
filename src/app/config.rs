//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Service/multiplexer settings
    pub service: ServiceConfig,
    /// Simulation harness settings
    #[serde(default)]
    pub simulate: SimulateConfig,
}

/// Service and multiplexer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Worker task queue capacity
    pub worker_queue_size: usize,
    /// Grace period for worker shutdown (ms)
    pub shutdown_grace_ms: u64,
    /// Default timeout when waiting for the service to connect (ms)
    pub start_timeout_ms: u64,
}

/// Simulation harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateConfig {
    /// Number of synthetic accessibility events to feed
    pub event_count: usize,
    /// Number of logging delegates to register
    pub delegate_count: usize,
    /// Delay between synthetic events (ms)
    pub step_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            worker_queue_size: 256,
            shutdown_grace_ms: 1000,
            start_timeout_ms: 3000,
        }
    }
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            event_count: 32,
            delegate_count: 3,
            step_delay_ms: 10,
        }
    }
}

impl ServiceConfig {
    /// Multiplexer options derived from this config.
    pub fn mux_options(&self) -> crate::mux::MuxOptions {
        crate::mux::MuxOptions {
            worker_queue_size: self.worker_queue_size,
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
        }
    }

    /// Default wait for the service to come up.
    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.service.worker_queue_size == 0 {
            return Err(crate::Error::Config(
                "worker_queue_size must be > 0".to_string(),
            ));
        }
        if self.service.shutdown_grace_ms == 0 {
            return Err(crate::Error::Config(
                "shutdown_grace_ms must be > 0".to_string(),
            ));
        }
        if self.simulate.event_count == 0 {
            return Err(crate::Error::Config("event_count must be > 0".to_string()));
        }
        if self.simulate.delegate_count == 0 {
            return Err(crate::Error::Config(
                "delegate_count must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".a11y_mux").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
