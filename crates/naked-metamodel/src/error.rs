//! Metamodel construction errors

use thiserror::Error;

/// Errors raised while configuring the reflector or building the metamodel.
///
/// Initialisation errors are fatal at startup. Domain errors raised by a
/// single member are logged by the reflector and the member is skipped.
#[derive(Debug, Error)]
pub enum ReflectionError {
    /// Invalid configuration detected at reflector startup
    #[error("Initialisation error: {message}")]
    Initialisation {
        /// What was wrong with the configuration
        message: String,
    },

    /// A domain member breaks a method contract (bad return type, etc.)
    #[error("Domain error in {member}: {message}")]
    Domain {
        /// Identifier of the offending member
        member: String,
        /// Description of the broken contract
        message: String,
    },

    /// A referenced type is not known to the type catalog
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Full name of the missing type
        name: String,
    },

    /// Reading a configuration or model file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that could not be read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// TOML configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON domain model could not be parsed
    #[error("Failed to parse domain model: {0}")]
    ModelParse(#[from] serde_json::Error),
}

impl ReflectionError {
    /// Shorthand for an initialisation error
    pub fn initialisation(message: impl Into<String>) -> Self {
        ReflectionError::Initialisation {
            message: message.into(),
        }
    }

    /// Shorthand for a domain error on a member
    pub fn domain(member: impl Into<String>, message: impl Into<String>) -> Self {
        ReflectionError::Domain {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors that must abort the build
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReflectionError::Domain { .. } | ReflectionError::UnknownType { .. }
        )
    }
}

/// Result alias for metamodel operations
pub type ReflectionResult<T> = Result<T, ReflectionError>;
