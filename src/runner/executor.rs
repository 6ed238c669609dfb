//! Parallel replay of IR commands.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::buildlog::CompilerInvocation;
use crate::util::context::{CancellationToken, GlobalContext};
use crate::util::fs::rename_into_place;
use crate::util::process::is_launchable;

use super::plan::{OutputPlan, PlannedInvocation};
use super::result::{InvocationResult, Outcome, RunResults, RunnerError};

/// Replays compiler invocations with IR output.
pub struct CommandRunner<'a> {
    ctx: &'a GlobalContext,
    show_progress: bool,
}

impl<'a> CommandRunner<'a> {
    pub fn new(ctx: &'a GlobalContext) -> Self {
        CommandRunner {
            ctx,
            show_progress: false,
        }
    }

    /// Show a progress bar while running.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every invocation, writing artifacts under `output_root/<target>/`.
    ///
    /// Individual failures are recorded in the results. The call itself
    /// fails only when no invocation could be launched at all, or on the
    /// first failure when fail-fast is configured.
    pub fn run(
        &self,
        invocations_by_target: &BTreeMap<String, Vec<CompilerInvocation>>,
        targets_to_products: &BTreeMap<String, String>,
        output_root: &Path,
    ) -> Result<RunResults, RunnerError> {
        let start = Instant::now();
        let plan = OutputPlan::new(invocations_by_target, output_root);

        for (target, invocations) in invocations_by_target {
            match targets_to_products.get(target) {
                Some(product) => tracing::debug!(
                    "`{}` ({}): {} invocation(s)",
                    target,
                    product,
                    invocations.len()
                ),
                None => tracing::debug!(
                    "`{}` has no product in the project: {} invocation(s)",
                    target,
                    invocations.len()
                ),
            }
        }

        if plan.is_empty() {
            tracing::warn!("no compiler invocations to run");
            return Ok(RunResults::new());
        }

        for dir in plan.target_dirs() {
            std::fs::create_dir_all(&dir)
                .map_err(|source| RunnerError::OutputDir { path: dir.clone(), source })?;
        }

        let jobs = self.ctx.config().jobs();
        let fail_fast = self.ctx.config().runner.fail_fast;
        let cancel = self.ctx.cancellation();
        tracing::info!("running {} invocation(s) on {} worker(s)", plan.len(), jobs);

        let pb = if self.show_progress && plan.len() > 1 {
            let pb = ProgressBar::new(plan.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        let results: Vec<InvocationResult> = pool.install(|| {
            plan.steps()
                .par_iter()
                .map(|step| {
                    pb.set_message(step.command.module.clone());
                    let result = execute(step, cancel);
                    if fail_fast && result.failed() {
                        cancel.cancel();
                    }
                    pb.inc(1);
                    result
                })
                .collect()
        });
        pb.finish_and_clear();

        let attempted = results.len();
        let launch_failures = results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::LaunchFailed { .. }))
            .count();
        let first_failure = results
            .iter()
            .find(|r| r.failed())
            .map(|r| (r.target.clone(), r.module.clone()));

        let mut by_target = RunResults::new();
        for result in results {
            by_target.entry(result.target.clone()).or_default().push(result);
        }

        tracing::info!(
            "ran {} invocation(s) in {:.2}s",
            attempted,
            start.elapsed().as_secs_f64()
        );

        if launch_failures == attempted {
            return Err(RunnerError::NothingExecuted {
                attempted,
                results: by_target,
            });
        }

        if fail_fast {
            if let Some((target, module)) = first_failure {
                return Err(RunnerError::FailFast {
                    target,
                    module,
                    results: by_target,
                });
            }
        }

        Ok(by_target)
    }
}

/// Run one planned command: compile into a private staging directory next
/// to the final path, then move the artifact into place.
fn execute(step: &PlannedInvocation, cancel: &CancellationToken) -> InvocationResult {
    let command = &step.command;
    let result = |outcome| InvocationResult {
        target: command.target.clone(),
        module: command.module.clone(),
        command: command.display(),
        outcome,
    };

    if cancel.is_cancelled() {
        return result(Outcome::Cancelled);
    }

    if !is_launchable(&command.program) {
        tracing::warn!("compiler not found: {}", command.program.display());
        return result(Outcome::LaunchFailed {
            diagnostic: format!("compiler not found: {}", command.program.display()),
        });
    }

    let (Some(target_dir), Some(file_name)) = (command.output.parent(), command.output.file_name())
    else {
        return result(Outcome::LaunchFailed {
            diagnostic: format!("invalid output path: {}", command.output.display()),
        });
    };

    let staging = match tempfile::Builder::new().prefix(".gen-ir-").tempdir_in(target_dir) {
        Ok(dir) => dir,
        Err(e) => {
            return result(Outcome::LaunchFailed {
                diagnostic: format!(
                    "failed to create staging directory in {}: {}",
                    target_dir.display(),
                    e
                ),
            })
        }
    };
    let staged = command.with_output(&staging.path().join(file_name));

    tracing::debug!("running {}", staged.display());
    let output = match staged.process().exec_cancellable(cancel) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("`{}` in `{}`: {:#}", command.module, command.target, e);
            return result(Outcome::LaunchFailed {
                diagnostic: format!("{:#}", e),
            });
        }
    };

    if output.cancelled {
        return result(Outcome::Cancelled);
    }

    if !output.success() {
        tracing::warn!(
            "`{}` in `{}` failed with {}",
            command.module,
            command.target,
            output
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("exit code {}", c))
        );
        return result(Outcome::Failed {
            exit_code: output.code(),
            diagnostic: output.diagnostic(),
        });
    }

    if !staged.output.is_file() {
        return result(Outcome::Failed {
            exit_code: output.code(),
            diagnostic: format!(
                "compiler succeeded but wrote no output to {}",
                staged.output.display()
            ),
        });
    }

    if let Err(e) = rename_into_place(&staged.output, &command.output) {
        return result(Outcome::Failed {
            exit_code: output.code(),
            diagnostic: format!("{:#}", e),
        });
    }

    result(Outcome::Succeeded {
        path: command.output.clone(),
    })
}
