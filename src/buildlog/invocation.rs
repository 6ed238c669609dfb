//! Compiler invocations recovered from a build log.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// The compiler a logged command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    Swiftc,
    Clang,
}

impl Compiler {
    /// Identify the compiler from the invoked tool's path.
    pub fn from_tool(tool: &str) -> Option<Self> {
        match tool.rsplit('/').next()? {
            "swiftc" => Some(Compiler::Swiftc),
            "clang" | "clang++" => Some(Compiler::Clang),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Swiftc => "swiftc",
            Compiler::Clang => "clang",
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extensions clang treats as compilable sources.
const CLANG_SOURCE_EXTENSIONS: &[&str] = &["c", "m", "mm", "cc", "cpp", "cxx", "c++", "C", "M"];

/// Clang options whose value is the following word.
const CLANG_VALUE_OPTIONS: &[&str] = &[
    "-o", "-x", "-MF", "-MT", "-MQ", "-I", "-F", "-D", "-U", "-include", "-isysroot",
    "-iquote", "-isystem", "-target", "-arch", "-Xclang", "-ivfsoverlay",
    "--serialize-diagnostics", "-index-store-path", "-index-unit-output-path",
];

/// One compiler command, attributed to the target whose log section it appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerInvocation {
    /// Owning target name.
    pub target: String,
    pub compiler: Compiler,
    /// Path of the invoked compiler program.
    pub tool: PathBuf,
    /// Directory from the step's `cd` line, if one was logged.
    pub working_dir: Option<PathBuf>,
    /// Arguments, without the tool itself.
    pub args: Vec<String>,
    /// Swift module name, or the stem of the compiled source for clang.
    pub module_name: String,
    /// Primary input files.
    pub inputs: Vec<String>,
    /// 1-based log line the command started on.
    pub line: usize,
}

impl CompilerInvocation {
    /// Build an invocation from split command words (tool first).
    ///
    /// `Ok(None)` means the command is a compiler run that isn't a compile
    /// step (assembler preprocessing, linking); `Err` carries a warning for a
    /// compiler command whose module can't be determined.
    pub fn from_words(
        target: &str,
        words: Vec<String>,
        working_dir: Option<PathBuf>,
        line: usize,
    ) -> Result<Option<Self>, String> {
        let mut words = words.into_iter();
        let Some(tool) = words.next() else {
            return Err("empty command".to_string());
        };
        let Some(compiler) = Compiler::from_tool(&tool) else {
            return Err(format!("`{}` is not a supported compiler", tool));
        };
        let args: Vec<String> = words.collect();

        let (module_name, inputs) = match compiler {
            Compiler::Clang => {
                if has_pair(&args, "-x", "assembler-with-cpp") {
                    return Ok(None);
                }
                if !args.iter().any(|a| a == "-c") {
                    return Ok(None);
                }
                let inputs = clang_inputs(&args);
                let Some(stem) = inputs.first().and_then(|i| Path::new(i).file_stem()) else {
                    return Err("clang compile step without an input file".to_string());
                };
                (stem.to_string_lossy().into_owned(), inputs)
            }
            Compiler::Swiftc => {
                let Some(module) = value_of(&args, "-module-name") else {
                    return Err("swiftc invocation without -module-name".to_string());
                };
                let inputs = args
                    .iter()
                    .filter(|a| a.ends_with(".swift") && !a.starts_with('-'))
                    .cloned()
                    .collect();
                (module.to_string(), inputs)
            }
        };

        Ok(Some(CompilerInvocation {
            target: target.to_string(),
            compiler,
            tool: PathBuf::from(tool),
            working_dir,
            args,
            module_name,
            inputs,
            line,
        }))
    }
}

/// The word following `flag`, if present.
pub fn value_of<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

fn clang_inputs(args: &[String]) -> Vec<String> {
    let mut inputs = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if CLANG_VALUE_OPTIONS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        let is_source = Path::new(arg)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| CLANG_SOURCE_EXTENSIONS.contains(&e));
        if is_source {
            inputs.push(arg.clone());
        }
    }
    inputs
}
