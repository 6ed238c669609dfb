//! Global context for gen-ir operations.
//!
//! The context is created once by the outermost caller and threaded through
//! every stage explicitly. It carries the resolved configuration, the
//! working directory, and the cancellation token shared with the runner.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::util::config::{load_config, Config, DEFAULT_CONFIG_FILE};

/// Cooperative cancellation flag shared between the host and worker threads.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Process-wide state for one gen-ir run.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    config: Config,
    cancel: CancellationToken,
}

impl GlobalContext {
    /// Create a context rooted at the current directory, loading
    /// `gen-ir.toml` from it when present.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let config = load_config(&cwd.join(DEFAULT_CONFIG_FILE))?;
        Ok(Self::with_config(cwd, config))
    }

    /// Create a context with an explicit working directory and configuration.
    pub fn with_config(cwd: impl Into<PathBuf>, config: Config) -> Self {
        GlobalContext {
            cwd: cwd.into(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// The working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration, for applying CLI overrides.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// The run's cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolve a path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
