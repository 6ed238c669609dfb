//! Shared utilities

pub mod args;
pub mod config;
pub mod context;
pub mod fs;
pub mod process;

pub use config::Config;
pub use context::{CancellationToken, GlobalContext};
