//! Build log parsing: recovering per-target compiler invocations from
//! `xcodebuild` output.

pub mod invocation;
pub mod parser;
pub mod source;

pub use invocation::{Compiler, CompilerInvocation};
pub use parser::{LogParser, LogWarning, ParsedLog};
pub use source::LogSource;
