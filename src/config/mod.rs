// Configuration Management Module
// Handles sysperf.toml loading, defaults, and validation

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::sampler::SamplerSettings;

/// Main sampler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Total wall-clock seconds to run.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Seconds between ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the CSV log is created in.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Filename prefix; collisions resolve to `<prefix>_1.csv`, `_2`, ...
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Buffered samples per flush.
    #[serde(default = "default_flush_batch_size")]
    pub flush_batch_size: usize,
}

// Default value functions
fn default_duration_secs() -> u64 { 600 }
fn default_interval_secs() -> u64 { 5 }
fn default_directory() -> String { ".".to_string() }
fn default_prefix() -> String { "system_performance_log".to_string() }
fn default_flush_batch_size() -> usize { 10 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            prefix: default_prefix(),
            flush_batch_size: default_flush_batch_size(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SamplerConfig {
    /// Load configuration from file or use defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let contents = std::fs::read_to_string(path)
                .context("Failed to read configuration file")?;

            let config: SamplerConfig = toml::from_str(&contents)
                .context("Failed to parse configuration file")?;

            config.validate()?;
            Ok(config)
        } else {
            warn!("Configuration file not found, using defaults");
            info!("Create sysperf.toml to customize configuration");
            Ok(Self::default())
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.run.interval_secs == 0 {
            anyhow::bail!("Sampling interval cannot be 0");
        }

        if self.run.duration_secs < self.run.interval_secs {
            anyhow::bail!(
                "Duration ({}s) is shorter than one interval ({}s)",
                self.run.duration_secs,
                self.run.interval_secs
            );
        }

        if self.run.duration_secs % self.run.interval_secs != 0 {
            warn!(
                duration_secs = self.run.duration_secs,
                interval_secs = self.run.interval_secs,
                ticks = self.ticks(),
                "Duration is not an exact multiple of the interval; the last partial interval is dropped"
            );
        }

        if self.output.flush_batch_size == 0 {
            anyhow::bail!("Flush batch size must be at least 1");
        }

        if self.output.prefix.is_empty() {
            anyhow::bail!("Output filename prefix cannot be empty");
        }

        Ok(())
    }

    /// Tick count implied by duration and interval (truncating).
    pub fn ticks(&self) -> u64 {
        self.run.duration_secs / self.run.interval_secs
    }

    /// Bridge to the sampler's run parameters.
    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            duration: Duration::from_secs(self.run.duration_secs),
            interval: Duration::from_secs(self.run.interval_secs),
            flush_batch_size: self.output.flush_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SamplerConfig::default();
        assert_eq!(config.run.duration_secs, 600);
        assert_eq!(config.run.interval_secs, 5);
        assert_eq!(config.output.prefix, "system_performance_log");
        assert_eq!(config.ticks(), 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_invalid() {
        let mut config = SamplerConfig::default();
        config.run.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_shorter_than_interval_invalid() {
        let mut config = SamplerConfig::default();
        config.run.duration_secs = 3;
        config.run.interval_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_exact_division_truncates() {
        let mut config = SamplerConfig::default();
        config.run.duration_secs = 19;
        config.run.interval_secs = 5;
        assert!(config.validate().is_ok());
        assert_eq!(config.ticks(), 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SamplerConfig = toml::from_str("[run]\nduration_secs = 20\n").unwrap();
        assert_eq!(config.run.duration_secs, 20);
        assert_eq!(config.run.interval_secs, 5);
        assert_eq!(config.output.flush_batch_size, 10);
    }
}
