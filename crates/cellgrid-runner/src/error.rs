//! Runner error types.

use thiserror::Error;

use cell_core::{Kind, NameChain};
use cellgrid_state::StateError;

/// Errors reported by an execution backend.
///
/// `NotFound` must be used whenever the addressed resource is absent so the
/// controller can tell "does not exist" apart from a backend failure.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: Kind, key: String },

    #[error("state store error: {0}")]
    State(#[from] StateError),

    #[error("backend error: {0}")]
    Backend(String),
}

impl RunnerError {
    pub fn not_found(kind: Kind, chain: &NameChain) -> Self {
        RunnerError::NotFound {
            kind,
            key: chain.key(),
        }
    }

    /// Whether this error reports an absent resource. Store lookups return
    /// `Option`, so a state error is never a NotFound.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RunnerError::NotFound { .. })
    }
}

pub type RunnerResult<T> = Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified() {
        let err = RunnerError::not_found(Kind::Space, &NameChain::space("r1", "s1"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "space not found: r1/s1");
    }

    #[test]
    fn store_and_backend_failures_are_not_not_found() {
        let err = RunnerError::from(StateError::Decode {
            key: "r/s/st/c".to_string(),
            reason: "missing field `spec`".to_string(),
        });
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "state store error: failed to decode r/s/st/c: missing field `spec`"
        );
        assert!(!RunnerError::Backend("boom".to_string()).is_not_found());
    }
}
