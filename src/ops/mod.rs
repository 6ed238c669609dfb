//! High-level operations.
//!
//! This module contains the implementation of the gen-ir pipeline.

pub mod gen_ir;

pub use gen_ir::{
    enforce_failure_threshold, gen_ir, validate_archive_path, GenIrOptions, GenIrOutcome, IR_DIR,
    TARGETS_DIR,
};
