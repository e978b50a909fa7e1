//! Search requests
//!
//! A request claims the session's single pending slot, installs a one-shot
//! observer for the answer line, and only then writes its commands. The
//! slot is released when the engine answers, or when the session stops.
//!
//! A caller that drops the request future does not release the slot: the
//! engine is still searching, and its answer must not be mistaken for the
//! answer to a later request.

use crate::error::{BridgeError, Result};
use crate::lifecycle::StopReason;
use crate::session::core::{EngineSession, PendingRequest, SessionInner};
use crate::session::state::SessionState;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use ucibridge_protocol::{Answer, LineKind, SearchParams};

impl SessionInner {
    fn complete_request(&self, line: LineKind) {
        let pending = self.shared.lock().pending.take();
        let Some(pending) = pending else {
            return;
        };

        let result = match line {
            LineKind::SearchAnswer(Answer {
                best: Some(best), ..
            }) => Ok(best),
            LineKind::SearchAnswer(Answer { raw, .. }) => Err(BridgeError::MalformedAnswer(raw)),
            LineKind::HandshakeTerminator => Err(BridgeError::MalformedAnswer(
                self.config.protocol.ready_terminator.clone(),
            )),
            LineKind::Other(raw) => Err(BridgeError::MalformedAnswer(raw)),
        };
        debug!(?result, "search answered");
        pending.resolve(result);
    }
}

impl EngineSession {
    /// Set the position/context for the next search
    ///
    /// Fire-and-forget: the protocol sends no acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SessionNotReady`] before the handshake completes.
    pub fn set_context(&self, descriptor: &str) -> Result<()> {
        self.ensure_ready()?;
        let line = self.inner.config.protocol.context_line(descriptor);
        self.inner.transport.send(&line);
        Ok(())
    }

    /// Run a search and resolve with its answer token
    ///
    /// Resolves exactly once, when the engine emits the answer line. With no
    /// request timeout configured, a stalled engine leaves this pending until
    /// the session is stopped or the process exits.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::SessionNotReady`] before the handshake completes
    /// - [`BridgeError::RequestAlreadyPending`] if another search is outstanding;
    ///   nothing is sent to the engine in that case
    /// - [`BridgeError::SessionStopped`] / [`BridgeError::ProcessTerminated`] if the
    ///   session ends first
    /// - [`BridgeError::RequestTimeout`] if the configured request timeout elapses
    /// - [`BridgeError::MalformedAnswer`] if the answer line has no answer token
    pub async fn request_best_move(&self, params: SearchParams) -> Result<String> {
        let answer = self.begin_request()?;
        self.send_search(&params);
        self.await_answer(answer).await
    }

    /// Run a search with the configured default limits
    pub async fn request_default(&self) -> Result<String> {
        self.request_best_move(self.inner.config.default_search)
            .await
    }

    /// Set the context, then run a search
    ///
    /// The pending slot is claimed before the context is sent, so an
    /// overlapping call fails without touching the engine.
    pub async fn best_move_for(&self, descriptor: &str, params: SearchParams) -> Result<String> {
        let answer = self.begin_request()?;
        let context = self.inner.config.protocol.context_line(descriptor);
        self.inner.transport.send(&context);
        self.send_search(&params);
        self.await_answer(answer).await
    }

    /// Whether a search is outstanding
    pub fn has_pending_request(&self) -> bool {
        self.inner.shared.lock().pending.is_some()
    }

    fn ensure_ready(&self) -> Result<()> {
        let state = self.state();
        if state != SessionState::Ready {
            return Err(BridgeError::SessionNotReady(state));
        }
        Ok(())
    }

    /// Claim the pending slot and install the answer observer
    fn begin_request(&self) -> Result<oneshot::Receiver<Result<String>>> {
        let mut shared = self.inner.shared.lock();
        if shared.state != SessionState::Ready {
            return Err(BridgeError::SessionNotReady(shared.state));
        }
        if shared.pending.is_some() {
            return Err(BridgeError::RequestAlreadyPending);
        }

        let (tx, rx) = oneshot::channel();
        let weak = Arc::downgrade(&self.inner);
        let observer = shared
            .observers
            .register(LineKind::is_search_answer, move |line| {
                if let Some(inner) = weak.upgrade() {
                    inner.complete_request(line);
                }
            });
        shared.pending = Some(PendingRequest {
            observer,
            responder: tx,
        });
        Ok(rx)
    }

    fn send_search(&self, params: &SearchParams) {
        let line = self.inner.config.protocol.search_line(params);
        self.inner.transport.send(&line);
    }

    async fn await_answer(&self, answer: oneshot::Receiver<Result<String>>) -> Result<String> {
        let Some(limit) = self.inner.config.request_timeout else {
            return answer.await.unwrap_or(Err(BridgeError::SessionStopped));
        };

        match tokio::time::timeout(limit, answer).await {
            Ok(result) => result.unwrap_or(Err(BridgeError::SessionStopped)),
            Err(_) => {
                // The engine's internal state is unknown now; start over
                warn!(?limit, "engine did not answer in time, resetting session");
                {
                    let mut shared = self.inner.shared.lock();
                    if let Some(pending) = shared.pending.take() {
                        shared.observers.remove(pending.observer);
                    }
                }
                self.inner
                    .reset(StopReason::RequestTimeout, || BridgeError::SessionStopped)
                    .await;
                Err(BridgeError::RequestTimeout(limit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::testing::MockTransport;

    async fn ready_session(mock: &MockTransport) -> EngineSession {
        mock.reply_to("uci", ["id name Mock", "uciok"]);
        let session =
            EngineSession::with_transport(SessionConfig::default(), Arc::new(mock.clone()));
        session.start().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_set_context_requires_ready() {
        let mock = MockTransport::new();
        let session =
            EngineSession::with_transport(SessionConfig::default(), Arc::new(mock.clone()));

        let result = session.set_context("8/8/8/8/8/8/8/K6k w - - 0 1");
        assert!(matches!(
            result,
            Err(BridgeError::SessionNotReady(SessionState::NotStarted))
        ));
    }

    #[tokio::test]
    async fn test_set_context_sends_position() {
        let mock = MockTransport::new();
        let session = ready_session(&mock).await;

        session
            .set_context("8/8/8/8/8/8/8/K6k w - - 0 1")
            .unwrap();
        assert_eq!(
            mock.sent().last().map(String::as_str),
            Some("position fen 8/8/8/8/8/8/8/K6k w - - 0 1")
        );
    }

    #[tokio::test]
    async fn test_answer_without_token_is_malformed() {
        let mock = MockTransport::new();
        let session = ready_session(&mock).await;
        mock.reply_to("go", ["bestmove"]);

        let result = session.request_best_move(SearchParams::depth(1)).await;
        assert!(matches!(result, Err(BridgeError::MalformedAnswer(line)) if line == "bestmove"));
        assert!(!session.has_pending_request());
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_request_default_uses_configured_limits() {
        let mock = MockTransport::new();
        let session = ready_session(&mock).await;
        mock.reply_to("go", ["bestmove e2e4"]);

        assert_eq!(session.request_default().await.unwrap(), "e2e4");
        assert!(mock.sent().contains(&"go depth 2 movetime 50".to_string()));
    }
}
