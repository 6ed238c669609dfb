//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Generate LLVM IR for every target in an Xcode archive by replaying the
/// compiler commands of its build log
#[derive(Parser)]
#[command(name = "gen-ir")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to an xcodebuild log, or `-` to read it from stdin
    pub log_path: String,

    /// Path to the .xcarchive to put IR into
    pub xcarchive: PathBuf,

    /// Project or workspace (defaults to the one in the current directory)
    #[arg(long, env = "GEN_IR_PROJECT_PATH")]
    pub project_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Don't echo piped build output
    #[arg(long)]
    pub quieter: bool,

    /// Number of concurrent compiler processes
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Stop at the first failed compiler invocation
    #[arg(long)]
    pub fail_fast: bool,

    /// Exit non-zero when more than this fraction of invocations fail (0.0 - 1.0)
    #[arg(long)]
    pub failure_threshold: Option<f64>,

    /// Configuration file (defaults to gen-ir.toml in the current directory)
    #[arg(long, env = "GEN_IR_CONFIG")]
    pub config: Option<PathBuf>,
}
