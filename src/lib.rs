//! gen-ir - LLVM IR extraction for Xcode projects
//!
//! This crate recovers the compiler invocations of an Xcode build from its
//! log, replays them with IR output, and organizes the artifacts by target
//! and product using the project's dependency graph.

pub mod buildlog;
pub mod ops;
pub mod postprocess;
pub mod project;
pub mod runner;
pub mod util;

/// Fixtures and fake-compiler helpers for unit tests.
#[cfg(test)]
pub mod test_support;

pub use buildlog::{CompilerInvocation, LogParser, LogSource, ParsedLog};
pub use postprocess::{OutputPostprocessor, RunReport};
pub use project::{DependencyGraph, DependencyResolver, TargetDependency, Workspace, XcodeProject};
pub use runner::{CommandRunner, InvocationResult};
pub use util::context::GlobalContext;
