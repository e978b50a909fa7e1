//! Core session management
//!
//! Provides the EngineSession struct, the startup handshake and teardown.
//!
//! All mutable session data (state, observers, the pending request) lives
//! behind one mutex that is only held for short, non-awaiting sections.
//! Transport callbacks run on the transport's reader tasks and go through
//! the same mutex.

use crate::config::SessionConfig;
use crate::error::{BridgeError, Result};
use crate::lifecycle::{SessionEvent, StopReason};
use crate::session::observer::{ObserverId, ObserverSet};
use crate::session::state::SessionState;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use ucibridge_protocol::LineKind;
use ucibridge_transport::{LineTransport, ProcessHandle, ProcessTransport};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// The single outstanding search
pub(crate) struct PendingRequest {
    pub(crate) observer: ObserverId,
    pub(crate) responder: oneshot::Sender<Result<String>>,
}

impl PendingRequest {
    pub(crate) fn resolve(self, result: Result<String>) {
        // The caller may have stopped awaiting; nothing to deliver then
        let _ = self.responder.send(result);
    }
}

pub(crate) struct Shared {
    pub(crate) state: SessionState,
    pub(crate) observers: ObserverSet,
    pub(crate) handshake: Option<oneshot::Sender<Result<()>>>,
    pub(crate) pending: Option<PendingRequest>,
    /// Bumped by every `start`; a start only commits if it is still current
    attempt: u64,
    /// Run id of the process this session is driving
    run: Option<u64>,
    /// Highest run id the session has let go of; exits at or below it are stale
    retired_run: u64,
}

impl Shared {
    /// Move to `Stopped`, handing back whatever was still waiting
    fn enter_stopped(&mut self) -> Waiters {
        self.state = SessionState::Stopped;
        self.observers.clear();
        if let Some(run) = self.run.take() {
            self.retire(run);
        }
        Waiters {
            handshake: self.handshake.take(),
            pending: self.pending.take(),
        }
    }

    /// Whether `attempt` is the latest start and nothing has stopped it
    fn is_attempt(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.state != SessionState::Stopped
    }

    fn retire(&mut self, run: u64) {
        self.retired_run = self.retired_run.max(run);
    }

    /// Whether an exit of `run` concerns the process this session drives
    ///
    /// Before `start` learns its run id, any run newer than the retired
    /// ones is taken to be the one being started.
    fn owns_run(&self, run: u64) -> bool {
        run > self.retired_run && self.run.is_none_or(|current| current == run)
    }
}

/// Waiters detached from the session, to be rejected outside the lock
struct Waiters {
    handshake: Option<oneshot::Sender<Result<()>>>,
    pending: Option<PendingRequest>,
}

impl Waiters {
    fn reject(self, error: impl Fn() -> BridgeError) {
        if let Some(handshake) = self.handshake {
            let _ = handshake.send(Err(error()));
        }
        if let Some(pending) = self.pending {
            pending.resolve(Err(error()));
        }
    }
}

pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    pub(crate) transport: Arc<dyn LineTransport>,
    pub(crate) shared: Mutex<Shared>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionInner {
    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn handle_line(&self, line: &str) {
        let kind = LineKind::classify(line, &self.config.protocol);
        let claimed = self.shared.lock().observers.claim(&kind);
        match claimed {
            Some(observer) => observer.fire(kind),
            None => {
                if kind.is_search_answer() {
                    debug!(line, "answer line with no pending request");
                }
            }
        }
    }

    fn handle_exit(&self, run: ProcessHandle, code: Option<i32>) {
        let run_id = run.run_id();
        let waiters = {
            let mut shared = self.shared.lock();
            if !shared.owns_run(run_id) {
                debug!(run_id, ?code, "exit of a run this session already let go of");
                None
            } else if shared.state == SessionState::Stopped {
                shared.retire(run_id);
                None
            } else {
                shared.retire(run_id);
                Some(shared.enter_stopped())
            }
        };

        // Reported for every run, including ones the session already stopped
        self.emit(SessionEvent::ProcessExited { code });
        if let Some(waiters) = waiters {
            warn!(?code, "engine process exited unexpectedly");
            waiters.reject(|| BridgeError::ProcessTerminated { code });
            self.emit(SessionEvent::Stopped {
                reason: StopReason::ProcessExited,
            });
        }
    }

    fn complete_handshake(&self) {
        let waiter = {
            let mut shared = self.shared.lock();
            if shared.state != SessionState::Starting {
                return;
            }
            shared.state = SessionState::Ready;
            shared.handshake.take()
        };

        info!("engine handshake complete");
        self.emit(SessionEvent::Ready);
        if let Some(waiter) = waiter {
            let _ = waiter.send(Ok(()));
        }
    }

    /// Tear the process down after the session gave up on it
    pub(crate) async fn reset(&self, reason: StopReason, error: impl Fn() -> BridgeError) {
        let waiters = {
            let mut shared = self.shared.lock();
            if shared.state == SessionState::Stopped {
                None
            } else {
                Some(shared.enter_stopped())
            }
        };
        let Some(waiters) = waiters else {
            return;
        };

        waiters.reject(error);
        if let Err(e) = self.transport.stop().await {
            warn!(error = %e, "failed to stop engine process during reset");
        }
        self.emit(SessionEvent::Stopped { reason });
    }
}

/// An engine process driven through its line protocol
///
/// Cloning is cheap and yields another handle to the same session, so one
/// owner can manage `start`/`stop` while other components issue requests.
#[derive(Clone)]
pub struct EngineSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl EngineSession {
    /// Create a session that will spawn the configured executable
    ///
    /// Nothing is spawned until [`EngineSession::start`].
    pub fn new(config: SessionConfig) -> Self {
        let transport = Arc::new(ProcessTransport::new(config.process.clone()));
        Self::with_transport(config, transport)
    }

    /// Create a session over an existing transport
    pub fn with_transport(config: SessionConfig, transport: Arc<dyn LineTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(SessionInner {
            config,
            transport: Arc::clone(&transport),
            shared: Mutex::new(Shared {
                state: SessionState::NotStarted,
                observers: ObserverSet::new(),
                handshake: None,
                pending: None,
                attempt: 0,
                run: None,
                retired_run: 0,
            }),
            events,
        });

        // Listeners hold weak references so the transport does not keep the session alive
        let weak = Arc::downgrade(&inner);
        transport.on_line(Arc::new(move |line: &str| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_line(line);
            }
        }));
        let weak = Arc::downgrade(&inner);
        transport.on_exit(Arc::new(move |run: ProcessHandle, code: Option<i32>| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_exit(run, code);
            }
        }));

        Self { inner }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Get the current session state
    pub fn state(&self) -> SessionState {
        self.inner.shared.lock().state
    }

    /// Check if the session accepts requests
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Start the engine using the configured startup timeout
    pub async fn start(&self) -> Result<()> {
        self.start_with_timeout(self.inner.config.startup_timeout)
            .await
    }

    /// Spawn the engine and complete the handshake
    ///
    /// Sends the init command and resolves the instant the ready terminator
    /// is observed.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Spawn`] if the process cannot be launched
    /// - [`BridgeError::StartupTimeout`] if the terminator is not seen in time;
    ///   the process is torn down and the session is left `Stopped`
    /// - [`BridgeError::ProcessTerminated`] if the process exits during the handshake
    /// - [`BridgeError::AlreadyStarted`] if the session is starting or ready
    /// - [`BridgeError::SessionStopped`] if [`EngineSession::stop`] is called
    ///   before the handshake completes; a process spawned meanwhile is shut down
    pub async fn start_with_timeout(&self, startup_timeout: Duration) -> Result<()> {
        let inner = &self.inner;
        inner
            .config
            .protocol
            .validate()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        let (tx, mut rx) = oneshot::channel();
        let attempt = {
            let mut shared = inner.shared.lock();
            if !shared.state.can_start() {
                return Err(BridgeError::AlreadyStarted(shared.state));
            }
            shared.state = SessionState::Starting;
            shared.attempt += 1;
            shared.handshake = Some(tx);
            let weak: Weak<SessionInner> = Arc::downgrade(inner);
            shared
                .observers
                .register(LineKind::is_handshake_terminator, move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.complete_handshake();
                    }
                });
            shared.attempt
        };

        let handle = match inner.transport.start().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "failed to spawn engine process");
                let waiters = {
                    let mut shared = inner.shared.lock();
                    shared.is_attempt(attempt).then(|| shared.enter_stopped())
                };
                // A stop that came in meanwhile has already reported the session stopped
                if let Some(waiters) = waiters {
                    waiters.reject(|| BridgeError::SessionStopped);
                    inner.emit(SessionEvent::Stopped {
                        reason: StopReason::SpawnFailed,
                    });
                }
                return Err(BridgeError::Spawn(e));
            }
        };

        // `stop` may have run while the process was spawning
        let committed = {
            let mut shared = inner.shared.lock();
            if shared.is_attempt(attempt) {
                shared.run = Some(handle.run_id());
                true
            } else {
                shared.retire(handle.run_id());
                false
            }
        };
        if !committed {
            info!(run_id = handle.run_id(), "session stopped during spawn, shutting engine down");
            if let Err(e) = inner.transport.stop().await {
                warn!(error = %e, "failed to stop abandoned engine process");
            }
            let cause = rx.try_recv().ok().and_then(Result::err);
            return Err(cause.unwrap_or(BridgeError::SessionStopped));
        }

        inner.emit(SessionEvent::Starting);
        inner.transport.send(&inner.config.protocol.init_command);

        match tokio::time::timeout(startup_timeout, rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a verdict
            Ok(Err(_)) => Err(BridgeError::SessionStopped),
            Err(_) => {
                if self.state().is_ready() {
                    // Terminator arrived just as the timer fired
                    return Ok(());
                }
                warn!(?startup_timeout, "engine handshake timed out");
                inner
                    .reset(StopReason::StartupTimeout, || BridgeError::StartupTimeout(startup_timeout))
                    .await;
                Err(BridgeError::StartupTimeout(startup_timeout))
            }
        }
    }

    /// Stop the session and the engine process
    ///
    /// Sends the quit command if the protocol defines one, then shuts the
    /// process down. A pending request is rejected with
    /// [`BridgeError::SessionStopped`]. Calling this on a stopped session
    /// does nothing.
    pub async fn stop(&self) -> Result<()> {
        let inner = &self.inner;
        let (previous, waiters) = {
            let mut shared = inner.shared.lock();
            let previous = shared.state;
            (previous, shared.enter_stopped())
        };
        waiters.reject(|| BridgeError::SessionStopped);

        if inner.transport.is_running() {
            if let Some(quit) = &inner.config.protocol.quit_command {
                inner.transport.send(quit);
            }
            inner
                .transport
                .stop()
                .await
                .map_err(BridgeError::Transport)?;
        }

        if previous != SessionState::Stopped {
            info!(from = %previous, "engine session stopped");
            inner.emit(SessionEvent::Stopped {
                reason: StopReason::Requested,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    fn session_with(mock: &MockTransport) -> EngineSession {
        EngineSession::with_transport(SessionConfig::default(), Arc::new(mock.clone()))
    }

    #[test]
    fn test_new_session_is_not_started() {
        let session = EngineSession::new(SessionConfig::default());
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(!session.is_ready());
    }

    #[test]
    fn test_exit_ownership_follows_retired_runs() {
        let mut shared = Shared {
            state: SessionState::Ready,
            observers: ObserverSet::new(),
            handshake: None,
            pending: None,
            attempt: 2,
            run: Some(2),
            retired_run: 1,
        };
        assert!(shared.owns_run(2));
        assert!(!shared.owns_run(1));
        assert!(!shared.owns_run(3));

        let _ = shared.enter_stopped();
        assert!(!shared.owns_run(2));
        // The next spawn is owned before its run id is known
        assert!(shared.owns_run(3));
    }

    #[tokio::test]
    async fn test_listeners_registered_once() {
        let mock = MockTransport::new();
        let _session = session_with(&mock);
        assert_eq!(mock.listener_counts(), (1, 1));
    }

    #[tokio::test]
    async fn test_handshake_terminator_ignored_outside_starting() {
        let mock = MockTransport::new();
        let session = session_with(&mock);

        session.inner.complete_handshake();
        assert_eq!(session.state(), SessionState::NotStarted);
    }

    #[tokio::test]
    async fn test_invalid_protocol_rejected_before_spawn() {
        let mock = MockTransport::new();
        let config = SessionConfig::default().with_protocol(
            ucibridge_protocol::ProtocolConfig::default().with_answer_prefix(""),
        );
        let session = EngineSession::with_transport(config, Arc::new(mock.clone()));

        let result = session.start().await;
        assert!(matches!(result, Err(BridgeError::Config(_))));
        assert_eq!(mock.start_count(), 0);
        assert_eq!(session.state(), SessionState::NotStarted);
    }
}
