//! Controller error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use cell_core::{ConversionError, Kind, NameChain, NameError};
use cellgrid_runner::RunnerError;

/// Controller operation a runner failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Get,
    List,
    Create,
    Delete,
    Purge,
    Start,
    Kill,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Purge => "purge",
            Operation::Start => "start",
            Operation::Kill => "kill",
        })
    }
}

/// Error category, for matching without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required name was missing, blank or malformed.
    Validation,
    /// The addressed resource (or a required parent) does not exist.
    NotFound,
    /// Children exist and neither force nor cascade was given.
    Dependency,
    /// A document could not be mapped onto the internal model.
    Conversion,
    /// The runner failed.
    Runner,
}

/// Errors returned by controller operations.
///
/// Messages always carry the trimmed name chain of the resource involved.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{0} name is required")]
    NameRequired(Kind),

    #[error("{kind} name \"{name}\" {source}")]
    InvalidName {
        kind: Kind,
        name: String,
        source: NameError,
    },

    #[error("{kind} not found ({chain})")]
    NotFound { kind: Kind, chain: NameChain },

    #[error(
        "{kind} \"{name}\" has {count} {child}(s) ({chain}); delete them first, or pass cascade or force"
    )]
    HasDependencies {
        kind: Kind,
        name: String,
        chain: NameChain,
        child: Kind,
        count: usize,
    },

    #[error("document {index}: cannot convert {kind}: {source}")]
    Conversion {
        kind: Kind,
        index: usize,
        #[source]
        source: ConversionError,
    },

    #[error("failed to {op} {kind} ({chain}): {source}")]
    Runner {
        op: Operation,
        kind: Kind,
        chain: NameChain,
        #[source]
        source: RunnerError,
    },
}

impl ControllerError {
    pub fn not_found(kind: Kind, chain: &NameChain) -> Self {
        ControllerError::NotFound {
            kind,
            chain: chain.clone(),
        }
    }

    /// Wrapper for a failed runner call.
    pub fn runner(op: Operation, kind: Kind, chain: &NameChain) -> impl FnOnce(RunnerError) -> Self {
        let chain = chain.clone();
        move |source| ControllerError::Runner {
            op,
            kind,
            chain,
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ControllerError::NameRequired(_) | ControllerError::InvalidName { .. } => {
                ErrorKind::Validation
            }
            ControllerError::NotFound { .. } => ErrorKind::NotFound,
            ControllerError::HasDependencies { .. } => ErrorKind::Dependency,
            ControllerError::Conversion { .. } => ErrorKind::Conversion,
            ControllerError::Runner { .. } => ErrorKind::Runner,
        }
    }

    /// The operation and resource kind a runner failure was raised by.
    pub fn runner_call(&self) -> Option<(Operation, Kind)> {
        match self {
            ControllerError::Runner { op, kind, .. } => Some((*op, *kind)),
            _ => None,
        }
    }

    /// Chain of the resource the error was raised for, if any.
    pub fn chain(&self) -> Option<&NameChain> {
        match self {
            ControllerError::NotFound { chain, .. }
            | ControllerError::HasDependencies { chain, .. }
            | ControllerError::Runner { chain, .. } => Some(chain),
            _ => None,
        }
    }

    /// Whether this error reports an absent resource, either directly or
    /// through a runner NotFound.
    pub fn is_not_found(&self) -> bool {
        match self {
            ControllerError::NotFound { .. } => true,
            ControllerError::Runner { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Like [`is_not_found`](Self::is_not_found), but only when the absent
    /// resource is `target` itself or one of its ancestors. A child that
    /// disappears while `target` is being deleted does not count.
    pub fn is_not_found_for(&self, target: &NameChain) -> bool {
        self.is_not_found() && self.chain().is_some_and(|chain| chain.contains(target))
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
