//! The per-run report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::buildlog::LogWarning;
use crate::runner::{InvocationResult, Outcome, RunResults};

/// File name of the serialized report inside the IR directory.
pub const REPORT_FILE: &str = "report.json";

/// One failed invocation, with enough context to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub target: String,
    pub module: String,
    pub exit_code: Option<i32>,
    pub diagnostic: String,
    pub command: String,
}

/// Artifacts placed for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductEntry {
    pub target: String,
    pub artifacts: Vec<PathBuf>,
}

/// Summary of a gen-ir run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<FailureEntry>,
    pub cancelled: usize,
    /// Native targets with a product but no emitted IR.
    pub empty_targets: Vec<String>,
    /// Product name -> placed artifacts.
    pub products: BTreeMap<String, ProductEntry>,
    /// Dependency cycles met while collecting product artifacts.
    pub cycles: Vec<Vec<String>>,
    pub log_warnings: Vec<LogWarning>,
    /// The build log reported a failed build.
    pub build_failed: bool,
}

impl RunReport {
    /// Count the outcomes in `results`.
    pub fn from_results(results: &RunResults) -> Self {
        let mut report = RunReport::default();
        for result in results.values().flatten() {
            report.record(result);
        }
        report
    }

    fn record(&mut self, result: &InvocationResult) {
        self.attempted += 1;
        match &result.outcome {
            Outcome::Succeeded { .. } => self.succeeded += 1,
            Outcome::Failed {
                exit_code,
                diagnostic,
            } => self.failed.push(FailureEntry {
                target: result.target.clone(),
                module: result.module.clone(),
                exit_code: *exit_code,
                diagnostic: diagnostic.clone(),
                command: result.command.clone(),
            }),
            Outcome::LaunchFailed { diagnostic } => self.failed.push(FailureEntry {
                target: result.target.clone(),
                module: result.module.clone(),
                exit_code: None,
                diagnostic: diagnostic.clone(),
                command: result.command.clone(),
            }),
            Outcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Fraction of attempted invocations that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.failed.len() as f64 / self.attempted as f64
        }
    }

    /// Whether failures exceed `threshold`. No threshold never fails a run.
    pub fn exceeds_threshold(&self, threshold: Option<f64>) -> bool {
        threshold.is_some_and(|t| self.failure_rate() > t)
    }

    /// Write the report as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        crate::util::fs::write_string(path, &json)
    }

    /// Log a human-readable summary.
    pub fn log_summary(&self) {
        tracing::info!(
            "{} of {} invocation(s) succeeded, {} failed, {} cancelled",
            self.succeeded,
            self.attempted,
            self.failed.len(),
            self.cancelled
        );

        for failure in &self.failed {
            let first_line = failure.diagnostic.lines().next().unwrap_or("");
            tracing::warn!("{} / {}: {}", failure.target, failure.module, first_line);
        }

        if !self.empty_targets.is_empty() {
            tracing::warn!(
                "no IR emitted for {} target(s): {}",
                self.empty_targets.len(),
                self.empty_targets.join(", ")
            );
        }

        for cycle in &self.cycles {
            tracing::warn!("dependency cycle: {}", cycle.join(" -> "));
        }
    }
}
