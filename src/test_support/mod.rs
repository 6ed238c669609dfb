//! Test utilities for gen-ir unit tests.
//!
//! Compiler replay is exercised against a shell script instead of a real
//! toolchain. The script is run through `/bin/sh` rather than executed
//! directly, so tests never spawn a file another thread may still have open
//! for writing.

pub mod fixtures;

use std::path::{Path, PathBuf};

use crate::buildlog::{Compiler, CompilerInvocation};

pub use fixtures::*;

/// Write [`FAKE_COMPILER_SCRIPT`] into `dir`. Returns the script path.
pub fn write_fake_compiler(dir: &Path) -> PathBuf {
    let path = dir.join("fake-compiler.sh");
    std::fs::write(&path, FAKE_COMPILER_SCRIPT).unwrap();
    path
}

/// A clang compile step of `source` that runs the fake compiler.
pub fn fake_clang_invocation(script: &Path, target: &str, source: &str) -> CompilerInvocation {
    let module_name = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    CompilerInvocation {
        target: target.to_string(),
        compiler: Compiler::Clang,
        tool: PathBuf::from("/bin/sh"),
        working_dir: None,
        args: vec![
            script.to_string_lossy().into_owned(),
            "-c".to_string(),
            source.to_string(),
        ],
        module_name,
        inputs: vec![source.to_string()],
        line: 1,
    }
}
