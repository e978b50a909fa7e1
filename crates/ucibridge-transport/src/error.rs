//! Transport error types

use std::fmt;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug)]
pub enum TransportError {
    /// The executable could not be launched
    Spawn {
        /// Executable that was requested
        executable: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// `start` was called while a process is still running
    AlreadyRunning,

    /// An operation needed a running process and there is none
    NotRunning,

    /// I/O error
    Io(std::io::Error),

    /// Process error (missing pipes, unexpected state)
    Process(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { executable, source } => {
                write!(f, "Failed to spawn '{}': {}", executable, source)
            }
            Self::AlreadyRunning => write!(f, "Process is already running"),
            Self::NotRunning => write!(f, "Process is not running"),
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Process(msg) => write!(f, "Process error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
