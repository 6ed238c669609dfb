//! Configuration file support for gen-ir.
//!
//! Settings are read from `gen-ir.toml` in the working directory, or from
//! the file named by `--config`. Command-line flags override both.
//!
//! ```toml
//! [runner]
//! jobs = 8
//! fail_fast = false
//! failure_threshold = 0.25
//!
//! [model]
//! verbose = false
//!
//! [log]
//! quieter = true
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gen-ir.toml";

/// gen-ir configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command replay settings
    pub runner: RunnerConfig,

    /// Project model settings
    pub model: ModelConfig,

    /// Build log input settings
    pub log: LogConfig,
}

/// Command replay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Number of concurrent compiler processes (None = available parallelism)
    pub jobs: Option<usize>,

    /// Stop dispatching after the first failed invocation
    pub fail_fast: bool,

    /// Fraction of failed invocations above which the run exits non-zero
    /// (None = failures never fail the run)
    pub failure_threshold: Option<f64>,
}

/// Project model configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Keep diagnostic-only fields (build settings, product types, ...) when decoding
    pub verbose: bool,
}

/// Build log input configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Don't echo piped build output to stdout
    pub quieter: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.runner.jobs == Some(0) {
            bail!("runner.jobs must be at least 1");
        }
        if let Some(threshold) = self.runner.failure_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                bail!(
                    "runner.failure_threshold must be between 0.0 and 1.0, got {}",
                    threshold
                );
            }
        }
        Ok(())
    }

    /// Worker count to use for the runner.
    pub fn jobs(&self) -> usize {
        self.runner.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Load configuration from `path` when it exists, defaults otherwise.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        tracing::debug!("loading config from {}", path.display());
        Config::load(path)
    } else {
        Ok(Config::default())
    }
}
