//! Errors surfaced by the coordinator.

use std::fmt;

use crate::models::ModelError;
use crate::oracle::OracleError;

/// Failure of a matheuristic run.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The instance or an oracle result is malformed.
    Model(ModelError),
    /// An oracle failed.
    Oracle(OracleError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(e) => write!(f, "invalid input: {e}"),
            Self::Oracle(e) => write!(f, "oracle error: {e}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            Self::Oracle(e) => Some(e),
        }
    }
}

impl From<ModelError> for SolveError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<OracleError> for SolveError {
    fn from(e: OracleError) -> Self {
        Self::Oracle(e)
    }
}
