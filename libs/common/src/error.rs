//! Custom error types for the common library
//!
//! This module defines the failure taxonomy of the record store gateway and
//! of the key-value state store shared by the services.

use redis::RedisError;
use thiserror::Error;

/// Failure of a read against the external record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// No backend credentials are available, no request was issued
    #[error("Record store is not configured")]
    Unconfigured,

    /// The backend settings cannot address the record store at all
    #[error("Record store configuration is invalid: {0}")]
    InvalidConfig(String),

    /// The backend refused the credentials for this table
    #[error("Record store refused access: {0}")]
    Unauthorized(String),

    /// The backend does not know the table, or rejected the filter formula
    #[error("Record store table or formula not found: {0}")]
    NotFound(String),

    /// Network-level failure, timeout, throttling or server error
    #[error("Record store temporarily unavailable: {0}")]
    Transient(String),

    /// The backend answered with a body that is not a record list
    #[error("Malformed record store response: {0}")]
    Malformed(String),
}

impl RecordError {
    /// Only transient failures are worth retrying against the same table
    pub fn is_transient(&self) -> bool {
        matches!(self, RecordError::Transient(_))
    }

    /// Failures no other table or formula can get around
    pub fn is_configuration(&self) -> bool {
        matches!(self, RecordError::Unconfigured | RecordError::InvalidConfig(_))
    }
}

/// Type alias for Result with RecordError
pub type RecordResult<T> = Result<T, RecordError>;

/// Custom error type for persisted state operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error occurred while connecting to the store
    #[error("State store connection error: {0}")]
    Connection(#[source] RedisError),

    /// Error occurred while executing a store command
    #[error("State store command error: {0}")]
    Command(#[source] RedisError),

    /// A stored value could not be encoded or decoded
    #[error("State store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
