//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No models configured for the council")]
    EmptyRoster,

    #[error("Model identifier cannot be empty")]
    EmptyModelName,

    #[error("Model {0} appears more than once in the roster")]
    DuplicateModel(String),

    #[error("Question cannot be empty")]
    EmptyQuestion,
}
