//! Error types for mapping documents to and from storage

use crate::format::FormatError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while materializing or reconstructing documents
#[derive(Debug, Error)]
pub enum ProvError {
    /// A caller handed over a value of the wrong kind, unreadable input
    /// text, or stored data that does not describe a PROV record
    #[error("Invalid argument: {0}")]
    InvalidArgumentType(String),

    /// A record cannot be given a valid identifier, or one of its attribute
    /// keys or values does not resolve
    #[error("Invalid PROV record: {0}")]
    InvalidProvRecord(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serializing a document failed
    #[error("Format error: {0}")]
    Format(FormatError),
}

/// Result type for mapping operations
pub type ProvResult<T> = Result<T, ProvError>;
