//! Job and scheduler configuration.
//!
//! Configuration is plain serde data with documented defaults. A scheduler
//! configuration can be read from TOML; missing keys fall back to the
//! defaults and unknown keys are ignored.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of rows processed between checkpoints.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of jobs running at once.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 3;

/// Per-job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Rows processed between pause/cancel checkpoints.
    pub chunk_size: usize,
    /// Carried for callers; jobs process their chunks sequentially.
    pub concurrency: usize,
    /// Carried but never consulted: failed jobs are not retried.
    pub retry_attempts: u32,
    /// Wall-clock limit for one job run.
    pub timeout_secs: u64,
    /// Carried but not enforced.
    pub memory_limit_mb: u64,
    /// Minimum spacing between progress snapshots.
    pub progress_update_interval_ms: u64,
    /// Impute missing values during cleaning.
    pub validation_enabled: bool,
    /// Carried but not enforced.
    pub compression_enabled: bool,
    /// Keep the input rows on the job after it completes.
    pub preserve_original: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: 2,
            retry_attempts: 3,
            timeout_secs: 300,
            memory_limit_mb: 512,
            progress_update_interval_ms: 1000,
            validation_enabled: true,
            compression_enabled: true,
            preserve_original: true,
        }
    }
}

impl BatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_update_interval_ms)
    }

    /// Chunk size, never zero.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    /// Apply a partial configuration on top of this one.
    #[must_use]
    pub fn merged(mut self, overrides: &BatchConfigOverrides) -> Self {
        if let Some(v) = overrides.chunk_size {
            self.chunk_size = v;
        }
        if let Some(v) = overrides.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = overrides.retry_attempts {
            self.retry_attempts = v;
        }
        if let Some(v) = overrides.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = overrides.memory_limit_mb {
            self.memory_limit_mb = v;
        }
        if let Some(v) = overrides.progress_update_interval_ms {
            self.progress_update_interval_ms = v;
        }
        if let Some(v) = overrides.validation_enabled {
            self.validation_enabled = v;
        }
        if let Some(v) = overrides.compression_enabled {
            self.compression_enabled = v;
        }
        if let Some(v) = overrides.preserve_original {
            self.preserve_original = v;
        }
        self
    }
}

/// Partial [`BatchConfig`]; `None` keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfigOverrides {
    pub chunk_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub memory_limit_mb: Option<u64>,
    pub progress_update_interval_ms: Option<u64>,
    pub validation_enabled: Option<bool>,
    pub compression_enabled: Option<bool>,
    pub preserve_original: Option<bool>,
}

impl BatchConfigOverrides {
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = Some(enabled);
        self
    }
}

/// Scheduler-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Jobs allowed in `running` or `paused` at once.
    pub max_concurrent_jobs: usize,
    /// Base configuration for new jobs.
    pub defaults: BatchConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            defaults: BatchConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parse a TOML document.
    ///
    /// ```toml
    /// max_concurrent_jobs = 4
    ///
    /// [defaults]
    /// chunk_size = 500
    /// timeout_secs = 60
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded scheduler configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::error::BatchError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.memory_limit_mb, 512);
        assert_eq!(config.progress_interval(), Duration::from_secs(1));
        assert!(config.validation_enabled);
        assert!(config.compression_enabled);
        assert!(config.preserve_original);
    }

    #[test]
    fn test_overrides_merge() {
        let overrides = BatchConfigOverrides::default()
            .with_chunk_size(10)
            .with_validation(false);
        let config = BatchConfig::default().merged(&overrides);
        assert_eq!(config.chunk_size, 10);
        assert!(!config.validation_enabled);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_toml_partial_document() {
        let config = SchedulerConfig::from_toml_str(
            "max_concurrent_jobs = 5\nunknown = 1\n[defaults]\nchunk_size = 50\n",
        )
        .unwrap();
        assert_eq!(config.max_concurrent_jobs, 5);
        assert_eq!(config.defaults.chunk_size, 50);
        assert_eq!(config.defaults.timeout_secs, 300);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SchedulerConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(SchedulerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(SchedulerConfig::from_toml_str("max_concurrent_jobs = \"many\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasnap.toml");
        fs::write(&path, "max_concurrent_jobs = 1\n").unwrap();
        assert_eq!(SchedulerConfig::load_from(&path).unwrap().max_concurrent_jobs, 1);
    }
}
