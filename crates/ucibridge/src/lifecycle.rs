//! Session lifecycle events
//!
//! A session is started and stopped by one owner. Other components that
//! need to react to its lifecycle subscribe to these events instead of
//! holding their own copy of the session state.
//!
//! # Example
//!
//! ```ignore
//! let mut events = session.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{}", event.description());
//!     }
//! });
//! ```

use serde::{Deserialize, Serialize};

/// Why a session ended up stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `stop` was called
    Requested,

    /// The engine could not be launched
    SpawnFailed,

    /// The handshake did not complete in time
    StartupTimeout,

    /// A search did not complete in time and the session was reset
    RequestTimeout,

    /// The engine process exited on its own
    ProcessExited,
}

/// Lifecycle events for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The process was spawned and the handshake began
    Starting,

    /// The handshake terminator was observed
    Ready,

    /// The session moved to `Stopped`
    Stopped {
        /// What caused the transition
        reason: StopReason,
    },

    /// The engine process exited (expectedly or not)
    ProcessExited {
        /// Exit code, if the process exited normally
        code: Option<i32>,
    },
}

impl SessionEvent {
    /// Get a human-readable description of this event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::Starting => "Engine starting".to_string(),
            SessionEvent::Ready => "Engine ready".to_string(),
            SessionEvent::Stopped { reason } => format!("Session stopped ({:?})", reason),
            SessionEvent::ProcessExited { code: Some(code) } => {
                format!("Engine exited with code {}", code)
            }
            SessionEvent::ProcessExited { code: None } => "Engine killed by signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_shape() {
        let event = SessionEvent::Stopped {
            reason: StopReason::RequestTimeout,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "stopped");
        assert_eq!(json["reason"], "request_timeout");
    }

    #[test]
    fn test_descriptions() {
        assert!(SessionEvent::Ready.description().contains("ready"));
        assert!(
            SessionEvent::ProcessExited { code: Some(3) }
                .description()
                .contains('3')
        );
        assert!(
            SessionEvent::ProcessExited { code: None }
                .description()
                .contains("signal")
        );
    }
}
