//! Xcode project loading: the object decoder, the project model, and
//! target dependency resolution.

pub mod dependency;
pub mod errors;
pub mod model;
pub mod object;
pub mod plist;
pub mod workspace;

pub use dependency::{DependencyGraph, DependencyResolver, TargetDependency};
pub use errors::{CycleError, DecodeError, ProjectError};
pub use model::XcodeProject;
pub use object::{DecodeOptions, ObjectKind, ProjectObject, Target, TargetKind};
pub use workspace::Workspace;
