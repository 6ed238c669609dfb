//! Project loading and resolution errors.

use std::path::PathBuf;

use thiserror::Error;

use super::plist::PlistError;

/// A recognized object kind is missing a required field or has a malformed one.
#[derive(Debug, Clone, Error)]
#[error("failed to decode {isa} `{identifier}`: {message}")]
pub struct DecodeError {
    pub identifier: String,
    pub isa: String,
    pub message: String,
}

/// Error while loading or resolving a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PlistError,
    },

    #[error("{}: missing or malformed `{key}` in project file", path.display())]
    MissingTable { path: PathBuf, key: &'static str },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("`{owner}` references `{identifier}` in `{field}`, which does not exist")]
    UnresolvedReference {
        owner: String,
        field: &'static str,
        identifier: String,
    },

    #[error(
        "target `{target}` has a dependency `{identifier}` that resolves to neither \
         a target nor a package product"
    )]
    UnresolvedDependency { target: String, identifier: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A dependency walk came back to a target already on its path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle: {}", cycle.join(" -> "))]
pub struct CycleError {
    /// Target names along the cycle, starting and ending with the same name.
    pub cycle: Vec<String>,
}
