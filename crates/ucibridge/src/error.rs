//! Error types for engine sessions
//!
//! Every failure reaches the immediate caller through the operation's
//! result. Nothing here is retried automatically; [`ErrorRecovery`] tells
//! the calling layer what a retry would involve so it can decide.

use crate::session::SessionState;
use std::time::Duration;
use thiserror::Error;
use ucibridge_transport::TransportError;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in session operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine executable could not be launched
    #[error("Engine process could not be launched: {0}")]
    Spawn(#[source] TransportError),

    /// The handshake terminator was not seen in time
    #[error("Engine did not complete the handshake within {0:?}")]
    StartupTimeout(Duration),

    /// A request was issued before the handshake completed
    #[error("Session is not ready (state: {0})")]
    SessionNotReady(SessionState),

    /// A search was issued while another one is outstanding
    #[error("A search request is already pending")]
    RequestAlreadyPending,

    /// The engine process exited on its own
    #[error("Engine process terminated (exit code: {code:?})")]
    ProcessTerminated {
        /// Exit code, if the process exited normally
        code: Option<i32>,
    },

    /// The session was stopped while the operation was in flight
    #[error("Session was stopped")]
    SessionStopped,

    /// The engine did not answer a search in time
    #[error("Engine did not answer within {0:?}")]
    RequestTimeout(Duration),

    /// `start` was called on a session that is starting or running
    #[error("Session already started (state: {0})")]
    AlreadyStarted(SessionState),

    /// The answer line did not carry an answer token
    #[error("Malformed answer line: '{0}'")]
    MalformedAnswer(String),

    /// Transport failure outside of spawning
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Recovery guidance for errors
pub trait ErrorRecovery {
    /// Whether re-issuing the operation can succeed without code changes
    fn is_retriable(&self) -> bool;

    /// Whether the session must be (re)started before retrying
    fn requires_restart(&self) -> bool;

    /// User-facing action to take
    fn suggested_action(&self) -> &'static str;
}

impl ErrorRecovery for BridgeError {
    fn is_retriable(&self) -> bool {
        match self {
            Self::StartupTimeout(_)
            | Self::ProcessTerminated { .. }
            | Self::SessionStopped
            | Self::RequestTimeout(_)
            | Self::Transport(_) => true,

            // Programming errors and bad configuration stay broken on retry
            Self::Spawn(_)
            | Self::SessionNotReady(_)
            | Self::RequestAlreadyPending
            | Self::AlreadyStarted(_)
            | Self::MalformedAnswer(_)
            | Self::Config(_) => false,
        }
    }

    fn requires_restart(&self) -> bool {
        matches!(
            self,
            Self::StartupTimeout(_)
                | Self::ProcessTerminated { .. }
                | Self::SessionStopped
                | Self::RequestTimeout(_)
        )
    }

    fn suggested_action(&self) -> &'static str {
        match self {
            Self::Spawn(_) => "Check that the engine path exists and is executable.",
            Self::StartupTimeout(_) => {
                "Engine did not finish its handshake. Call start() again, \
                or raise the startup timeout for slow engines."
            }
            Self::SessionNotReady(_) => "Await start() before issuing commands.",
            Self::RequestAlreadyPending => {
                "Wait for the outstanding search to resolve before issuing another."
            }
            Self::ProcessTerminated { .. } => {
                "Engine exited unexpectedly. Call start() to launch a new process."
            }
            Self::SessionStopped => "Session was stopped. Call start() to resume.",
            Self::RequestTimeout(_) => {
                "Engine stalled and the session was reset. Call start() and retry the search."
            }
            Self::AlreadyStarted(_) => "Call stop() before starting the session again.",
            Self::MalformedAnswer(_) => "Check the configured answer prefix against the engine output.",
            Self::Transport(_) => "Check engine process health and retry.",
            Self::Config(_) => "Fix the protocol configuration and create a new session.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BridgeError::RequestAlreadyPending, false, false)]
    #[case(BridgeError::SessionNotReady(SessionState::Starting), false, false)]
    #[case(BridgeError::AlreadyStarted(SessionState::Ready), false, false)]
    #[case(BridgeError::MalformedAnswer("bestmove".to_string()), false, false)]
    #[case(BridgeError::Config("empty answer prefix".to_string()), false, false)]
    #[case(BridgeError::StartupTimeout(Duration::from_millis(50)), true, true)]
    #[case(BridgeError::RequestTimeout(Duration::from_secs(1)), true, true)]
    #[case(BridgeError::SessionStopped, true, true)]
    #[case(BridgeError::Transport(TransportError::NotRunning), true, false)]
    fn test_recovery_guidance(
        #[case] err: BridgeError,
        #[case] retriable: bool,
        #[case] restart: bool,
    ) {
        assert_eq!(err.is_retriable(), retriable, "{}", err);
        assert_eq!(err.requires_restart(), restart, "{}", err);
        assert!(!err.suggested_action().is_empty());
    }

    #[test]
    fn test_process_loss_requires_restart() {
        let err = BridgeError::ProcessTerminated { code: Some(1) };
        assert!(err.is_retriable());
        assert!(err.requires_restart());
        assert!(err.suggested_action().contains("start()"));
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error;

        let err = BridgeError::Spawn(TransportError::Spawn {
            executable: "missing-engine".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        assert!(!err.is_retriable());
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Engine process could not be launched: Failed to spawn 'missing-engine': not found"
        );
    }

    #[test]
    fn test_display_includes_state() {
        let err = BridgeError::SessionNotReady(SessionState::NotStarted);
        assert_eq!(err.to_string(), "Session is not ready (state: not started)");
    }
}
