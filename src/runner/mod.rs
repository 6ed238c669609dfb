//! Command replay: turning logged compiler invocations into IR-emitting
//! commands and running them.

pub mod command;
pub mod executor;
pub mod plan;
pub mod result;

pub use command::IrCommand;
pub use executor::CommandRunner;
pub use plan::{OutputPlan, PlannedInvocation, IR_EXTENSION};
pub use result::{InvocationResult, Outcome, RunResults, RunnerError};
