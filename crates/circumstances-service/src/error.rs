//! Service error types

use circumstances_domain::{HashError, ValidationError};
use thiserror::Error;

/// Errors that can occur during service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Payload failed required-field validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A record already exists for the claimant, or the record to update is missing
    #[error("Circumstances already exists")]
    DuplicateRecord,

    /// Payload could not be serialized for hashing
    #[error("Serialization error: {0}")]
    Serialization(#[from] HashError),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),
}
