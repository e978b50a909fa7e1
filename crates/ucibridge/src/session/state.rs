//! Session state
//!
//! `NotStarted -> Starting -> Ready -> Stopped`. `Starting` is entered when
//! the process is spawned and left for `Ready` only once the handshake
//! terminator is seen. Any state moves to `Stopped` on stop or process exit;
//! a stopped session may be started again.

use std::fmt;

/// Current state of an engine session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// `start` has never been called
    NotStarted,

    /// The process is running and the handshake is in progress
    Starting,

    /// The handshake completed; requests are accepted
    Ready,

    /// The session was stopped or the process exited
    Stopped,
}

impl SessionState {
    /// Whether requests are accepted
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    /// Whether `start` may be called from this state
    pub fn can_start(self) -> bool {
        matches!(self, Self::NotStarted | Self::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
