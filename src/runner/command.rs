//! Deriving IR-emitting commands from logged compiler invocations.

use std::path::{Path, PathBuf};

use crate::buildlog::{Compiler, CompilerInvocation};
use crate::util::args;
use crate::util::process::ProcessBuilder;

/// Clang flags dropped along with their value.
const CLANG_STRIP_WITH_VALUE: &[&str] = &[
    "-o",
    "-MT",
    "-MF",
    "-MQ",
    "--serialize-diagnostics",
    "-index-store-path",
    "-index-unit-output-path",
];

/// Clang flags dropped on their own.
const CLANG_STRIP: &[&str] = &["-MMD", "-MD"];

/// Swift driver flags dropped along with their value.
const SWIFTC_STRIP_WITH_VALUE: &[&str] = &[
    "-o",
    "-emit-module-path",
    "-emit-objc-header-path",
    "-emit-module-interface-path",
    "-output-file-map",
    "-index-store-path",
    "-num-threads",
    "-j",
];

/// Swift driver flags dropped on their own.
const SWIFTC_STRIP: &[&str] = &[
    "-emit-module",
    "-emit-objc-header",
    "-emit-module-interface",
    "-emit-dependencies",
    "-emit-const-values",
    "-parseable-output",
    "-use-frontend-parseable-output",
    "-serialize-diagnostics",
    "-incremental",
    "-enable-batch-mode",
    "-whole-module-optimization",
    "-wmo",
    "-c",
];

/// A compiler command that writes IR to `output` instead of object code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrCommand {
    pub target: String,
    pub module: String,
    pub compiler: Compiler,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Where the compiler is told to write.
    pub output: PathBuf,
}

impl IrCommand {
    /// Derive the IR command for `invocation`, writing to `output`.
    ///
    /// The invocation is only read; every derived command is independent.
    pub fn derive(invocation: &CompilerInvocation, output: &Path) -> Self {
        let output_arg = output.to_string_lossy().into_owned();

        let args = match invocation.compiler {
            Compiler::Clang => {
                let mut args = strip_flags(&invocation.args, CLANG_STRIP_WITH_VALUE, CLANG_STRIP);
                args.extend(["-emit-llvm".to_string(), "-o".to_string(), output_arg]);
                args
            }
            Compiler::Swiftc => {
                let mut args =
                    strip_flags(&invocation.args, SWIFTC_STRIP_WITH_VALUE, SWIFTC_STRIP);
                args.retain(|a| !is_joined_jobs_flag(a));
                args.extend([
                    "-whole-module-optimization".to_string(),
                    "-emit-bc".to_string(),
                    "-o".to_string(),
                    output_arg,
                ]);
                args
            }
        };

        IrCommand {
            target: invocation.target.clone(),
            module: invocation.module_name.clone(),
            compiler: invocation.compiler,
            program: invocation.tool.clone(),
            args,
            working_dir: invocation.working_dir.clone(),
            output: output.to_path_buf(),
        }
    }

    /// The same command pointed at a different output path.
    pub fn with_output(&self, output: &Path) -> Self {
        let mut command = self.clone();
        if let Some(last) = command.args.last_mut() {
            *last = output.to_string_lossy().into_owned();
        }
        command.output = output.to_path_buf();
        command
    }

    /// A process builder for this command.
    pub fn process(&self) -> ProcessBuilder {
        let mut process = ProcessBuilder::new(&self.program).args(&self.args);
        if let Some(dir) = &self.working_dir {
            process = process.cwd(dir);
        }
        process
    }

    /// Shell-ready rendition for logs and reports.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy().as_ref())
            .chain(self.args.iter().map(String::as_str))
            .map(args::quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn strip_flags(args: &[String], with_value: &[&str], alone: &[&str]) -> Vec<String> {
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if with_value.contains(&arg.as_str()) {
            iter.next();
        } else if !alone.contains(&arg.as_str()) {
            kept.push(arg.clone());
        }
    }
    kept
}

/// `-j8` style job counts.
fn is_joined_jobs_flag(arg: &str) -> bool {
    arg.strip_prefix("-j")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
