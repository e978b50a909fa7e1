//! Shared fixtures for session integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use ucibridge::testing::MockTransport;
use ucibridge::{EngineSession, SessionConfig, SessionEvent};

/// Mock that completes the handshake as soon as `uci` is sent
pub fn handshaking_mock() -> MockTransport {
    let mock = MockTransport::new();
    mock.reply_to("uci", ["id name Mock 1.0", "id author Tests", "option name Hash type spin", "uciok"]);
    mock
}

/// Session over `mock` with default configuration
pub fn session_over(mock: &MockTransport) -> EngineSession {
    session_with_config(mock, SessionConfig::default())
}

pub fn session_with_config(mock: &MockTransport, config: SessionConfig) -> EngineSession {
    EngineSession::with_transport(config, Arc::new(mock.clone()))
}

/// A session that has completed its handshake
pub async fn ready_session(mock: &MockTransport) -> EngineSession {
    let session = session_over(mock);
    session.start().await.expect("handshake should complete");
    session
}

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Drain every event currently buffered on `events`
pub fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
