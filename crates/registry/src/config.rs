//! Registry configuration management

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use backend::LogLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub log: LogSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default tracing filter, overridable via RUST_LOG
    pub level: String,
    /// libusb-level verbosity forwarded to the backend
    #[serde(default)]
    pub backend_level: LogLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Topology poll interval in milliseconds
    #[serde(default = "MonitorSettings::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}

impl MonitorSettings {
    fn default_poll_interval_ms() -> u64 {
        1000
    }

    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log: LogSettings {
                level: "info".to_string(),
                backend_level: LogLevel::None,
            },
            monitor: MonitorSettings::default(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from the specified path, or from the default
    /// location when none is given.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let default = Self::default_path();
            if !default.exists() {
                return Err(anyhow!("No configuration file found, using defaults"));
            }
            default
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: RegistryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found.
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-registry").join("registry.toml")
        } else {
            PathBuf::from(".config/usb-registry/registry.toml")
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.log.level,
                valid_levels.join(", ")
            ));
        }

        if self.monitor.poll_interval_ms == 0 {
            return Err(anyhow!("Monitor poll interval must be greater than 0"));
        }

        Ok(())
    }
}
