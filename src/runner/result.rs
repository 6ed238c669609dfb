//! Outcomes of replayed invocations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Target name -> results, in the target's invocation order.
pub type RunResults = BTreeMap<String, Vec<InvocationResult>>;

/// How one replayed invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The artifact is in place at `path`.
    Succeeded { path: PathBuf },
    /// The compiler ran and reported an error.
    Failed {
        exit_code: Option<i32>,
        diagnostic: String,
    },
    /// The compiler could not be started.
    LaunchFailed { diagnostic: String },
    /// Cancelled before or while running.
    Cancelled,
}

/// The result of replaying one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub target: String,
    pub module: String,
    /// The command that was run, shell-quoted.
    pub command: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl InvocationResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded { .. })
    }

    /// Whether the invocation ran (or tried to) and did not succeed.
    pub fn failed(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Failed { .. } | Outcome::LaunchFailed { .. }
        )
    }

    pub fn cancelled(&self) -> bool {
        matches!(self.outcome, Outcome::Cancelled)
    }

    /// The artifact path, for a successful invocation.
    pub fn artifact(&self) -> Option<&PathBuf> {
        match &self.outcome {
            Outcome::Succeeded { path } => Some(path),
            _ => None,
        }
    }

    /// Captured compiler output, for a failed invocation.
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { diagnostic, .. } | Outcome::LaunchFailed { diagnostic } => {
                Some(diagnostic)
            }
            _ => None,
        }
    }
}

/// Errors that end a run as a whole.
///
/// `NothingExecuted` and `FailFast` carry whatever results were collected.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(
        "none of the {attempted} compiler invocation(s) could be launched; \
         is the toolchain installed?"
    )]
    NothingExecuted { attempted: usize, results: RunResults },

    #[error("`{module}` in target `{target}` failed; stopping (fail-fast)")]
    FailFast {
        target: String,
        module: String,
        results: RunResults,
    },

    #[error("failed to create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl RunnerError {
    /// Results collected before the run stopped.
    pub fn results(&self) -> Option<&RunResults> {
        match self {
            RunnerError::NothingExecuted { results, .. }
            | RunnerError::FailFast { results, .. } => Some(results),
            _ => None,
        }
    }
}
