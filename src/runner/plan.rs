//! Output naming for a run.
//!
//! Every invocation gets its final artifact path before anything executes,
//! so workers never share a naming table. Names are a pure function of the
//! parsed log and therefore stable between runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::buildlog::CompilerInvocation;

use super::command::IrCommand;

/// Extension of emitted IR artifacts.
pub const IR_EXTENSION: &str = "bc";

/// One invocation scheduled to run.
#[derive(Debug, Clone)]
pub struct PlannedInvocation {
    /// Position within the target's invocation list.
    pub index: usize,
    pub command: IrCommand,
}

/// Every command of a run, with collision-free output paths.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    steps: Vec<PlannedInvocation>,
}

impl OutputPlan {
    /// Assign an output path to every invocation under `output_root`.
    ///
    /// The file name is `<module>.bc`. A name claimed by more than one
    /// invocation anywhere in the run becomes `<module>-<target>.bc`. File
    /// names are unique across the whole run, since products gather several
    /// targets into one directory; any name already taken gets a numeric
    /// suffix.
    pub fn new(
        invocations_by_target: &BTreeMap<String, Vec<CompilerInvocation>>,
        output_root: &Path,
    ) -> Self {
        let mut claims: HashMap<&str, usize> = HashMap::new();
        for invocation in invocations_by_target.values().flatten() {
            *claims.entry(invocation.module_name.as_str()).or_default() += 1;
        }

        let mut used: HashSet<String> = HashSet::new();
        let mut steps = Vec::new();
        for (target, invocations) in invocations_by_target {
            let target_dir = output_root.join(target);

            for (index, invocation) in invocations.iter().enumerate() {
                let module = invocation.module_name.as_str();
                let stem = if claims.get(module).copied().unwrap_or(0) > 1 {
                    format!("{}-{}", module, target)
                } else {
                    module.to_string()
                };

                let mut file_name = format!("{}.{}", stem, IR_EXTENSION);
                let mut ordinal = 1;
                while !used.insert(file_name.clone()) {
                    ordinal += 1;
                    file_name = format!("{}-{}.{}", stem, ordinal, IR_EXTENSION);
                }

                if claims.get(module).copied().unwrap_or(0) > 1 {
                    tracing::debug!(
                        "module `{}` is compiled more than once; writing {}/{}",
                        module,
                        target,
                        file_name
                    );
                }

                steps.push(PlannedInvocation {
                    index,
                    command: IrCommand::derive(invocation, &target_dir.join(&file_name)),
                });
            }
        }

        OutputPlan { steps }
    }

    pub fn steps(&self) -> &[PlannedInvocation] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Distinct target directories the plan writes into.
    pub fn target_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .steps
            .iter()
            .filter_map(|s| s.command.output.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}
