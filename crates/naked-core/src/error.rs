//! Runtime errors

use naked_metamodel::ReflectionError;
use thiserror::Error;

/// Errors raised by the runtime: invocation, persistence, transactions and mementos
#[derive(Debug, Error)]
pub enum NakedError {
    /// Metamodel construction or lookup failed
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// The framework was assembled without a required component
    #[error("Initialisation error: {0}")]
    Initialisation(String),

    /// Invoking a domain method failed
    #[error("Failed to invoke {method}: {message}")]
    Invoke {
        /// Method identifier
        method: String,
        /// What went wrong
        message: String,
    },

    /// A value could not be accepted as input
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// An object or service could not be located
    #[error("Find object error: {0}")]
    FindObject(String),

    /// Transaction discipline was broken
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The object store rejected an operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A collection memento could not be encoded or decoded
    #[error("Invalid memento: {0}")]
    Memento(String),

    /// JSON encoding of an identity or value failed
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl NakedError {
    /// Shorthand for an invocation error
    pub fn invoke(method: impl ToString, message: impl Into<String>) -> Self {
        NakedError::Invoke {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias for runtime operations
pub type NakedResult<T> = Result<T, NakedError>;
