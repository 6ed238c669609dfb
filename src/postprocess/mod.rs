//! Output postprocessing: product placement and the run report.
//!
//! The runner leaves artifacts under `IR/Targets/<target>/`. For every
//! target with a product, the postprocessor gathers the target's own IR and
//! that of everything it depends on into `IR/Products/<product>/`, so each
//! product directory is self-contained.

pub mod report;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::project::{DependencyGraph, TargetKind, Workspace};
use crate::runner::RunResults;
use crate::util::fs::{copy_into, ensure_dir};

pub use report::{FailureEntry, ProductEntry, RunReport, REPORT_FILE};

/// Directory under the IR root holding per-product artifact sets.
pub const PRODUCTS_DIR: &str = "Products";

/// Places artifacts and builds the report.
pub struct OutputPostprocessor<'a> {
    workspace: &'a Workspace,
    graph: &'a DependencyGraph,
}

impl<'a> OutputPostprocessor<'a> {
    pub fn new(workspace: &'a Workspace, graph: &'a DependencyGraph) -> Self {
        OutputPostprocessor { workspace, graph }
    }

    /// Verify and place the results of a run under `ir_root`.
    pub fn process(&self, results: &RunResults, ir_root: &Path) -> Result<RunReport> {
        let mut report = RunReport::from_results(results);
        let mut cycles: BTreeSet<Vec<String>> = BTreeSet::new();
        let products_root = ir_root.join(PRODUCTS_DIR);

        for (project, target) in self.workspace.targets() {
            let Some(product) = project.product_name(target) else {
                continue;
            };

            let own = artifacts_of(results, &target.name);
            if own.is_empty() {
                if target.kind == TargetKind::Native {
                    tracing::debug!("`{}` produced no IR", target.name);
                    report.empty_targets.push(target.name.clone());
                }
                continue;
            }

            let mut artifacts = own;
            match self.graph.transitive_dependencies(&target.name) {
                Ok(dependencies) => {
                    for dependency in dependencies {
                        artifacts.extend(artifacts_of(results, &dependency));
                    }
                }
                Err(cycle) => {
                    tracing::warn!(
                        "`{}`: {}; placing only its own artifacts",
                        target.name,
                        cycle
                    );
                    cycles.insert(normalize_cycle(&cycle.cycle));
                }
            }

            let dir = products_root.join(product);
            if dir.exists() {
                std::fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to clear {}", dir.display()))?;
            }
            ensure_dir(&dir)?;

            let mut names = HashSet::new();
            let mut placed = Vec::with_capacity(artifacts.len());
            for artifact in &artifacts {
                if let Some(name) = artifact.file_name() {
                    if !names.insert(name.to_owned()) {
                        bail!(
                            "{} would overwrite another artifact in {}",
                            artifact.display(),
                            dir.display()
                        );
                    }
                }
                placed.push(copy_into(artifact, &dir)?);
            }
            tracing::debug!("placed {} artifact(s) for {}", placed.len(), product);

            report.products.insert(
                product.to_string(),
                ProductEntry {
                    target: target.name.clone(),
                    artifacts: placed,
                },
            );
        }

        report.cycles = cycles.into_iter().collect();
        Ok(report)
    }
}

/// Artifacts a target produced, in invocation order.
fn artifacts_of(results: &RunResults, target: &str) -> Vec<PathBuf> {
    results
        .get(target)
        .map(|results| results.iter().filter_map(|r| r.artifact().cloned()).collect())
        .unwrap_or_default()
}

/// Rotate a closed cycle to start at its smallest name, so one cycle met
/// from different targets is recorded once.
fn normalize_cycle(cycle: &[String]) -> Vec<String> {
    let open = match cycle.split_last() {
        Some((last, rest)) if rest.first() == Some(last) => rest,
        _ => cycle,
    };
    let Some(start) = open
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let mut normalized: Vec<String> =
        open[start..].iter().chain(&open[..start]).cloned().collect();
    normalized.push(normalized[0].clone());
    normalized
}
