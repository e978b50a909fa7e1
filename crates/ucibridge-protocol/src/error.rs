//! Error types for protocol configuration

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised when a protocol configuration cannot drive a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A command or token that must be present is empty
    #[error("Protocol field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// A token that is matched against a single word contains whitespace
    #[error("Protocol field '{field}' must be a single token, got '{value}'")]
    NotAToken {
        /// Name of the offending field
        field: &'static str,
        /// The configured value
        value: String,
    },
}
