//! Testing utilities for integration tests
//!
//! Provides a scripted in-memory transport for exercising [`EngineSession`]
//! without an engine executable.
//!
//! [`EngineSession`]: crate::EngineSession

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use ucibridge_transport::{
    ExitListener, LineFramer, LineListener, LineTransport, ProcessHandle, Result, TransportError,
};

#[derive(Default)]
struct MockState {
    running: bool,
    fail_spawn: bool,
    start_delay: Option<Duration>,
    runs: u64,
    stops: usize,
    sent: Vec<String>,
    replies: HashMap<String, Vec<String>>,
    framer: LineFramer,
    line_listeners: Vec<LineListener>,
    exit_listeners: Vec<ExitListener>,
}

/// Mock transport that simulates an engine process
///
/// Allows tests to:
/// - Script replies to commands, keyed by the command's first token
/// - Inject output lines or raw, arbitrarily chunked output
/// - Simulate the process exiting, failing to spawn, or spawning slowly
/// - Inspect every line written while the "process" was running
///
/// Clones share state, so a test can keep one handle while the session
/// owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a mock with no scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `lines` whenever a command starting with `command` is sent
    ///
    /// Replies are delivered synchronously from `send`. Registering the same
    /// command again replaces its replies.
    pub fn reply_to<I, S>(&self, command: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        self.state.lock().replies.insert(command.to_string(), lines);
    }

    /// Stop replying to `command`
    pub fn clear_reply(&self, command: &str) {
        self.state.lock().replies.remove(command);
    }

    /// Make the next `start` calls fail as if the executable were missing
    pub fn fail_spawn(&self) {
        self.state.lock().fail_spawn = true;
    }

    /// Make `start` take `delay` before the process counts as running
    pub fn delay_start(&self, delay: Duration) {
        self.state.lock().start_delay = Some(delay);
    }

    /// Deliver one output line to the listeners
    pub fn emit_line(&self, line: &str) {
        let listeners = self.state.lock().line_listeners.clone();
        for listener in &listeners {
            listener(line);
        }
    }

    /// Deliver a raw output chunk, which may hold partial lines
    pub fn emit_output(&self, chunk: &str) {
        let lines = self.state.lock().framer.push(chunk.as_bytes());
        for line in lines {
            self.emit_line(&line);
        }
    }

    /// Simulate the process exiting on its own
    pub fn exit(&self, code: Option<i32>) {
        let (run, listeners) = {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            state.running = false;
            (state.runs, state.exit_listeners.clone())
        };
        for listener in &listeners {
            listener(ProcessHandle::new(run, None), code);
        }
    }

    /// Report an exit for an earlier run without touching the current one
    ///
    /// Mirrors a process supervisor whose exit notification lands after a
    /// newer run has already been started.
    pub fn deliver_exit(&self, run_id: u64, code: Option<i32>) {
        let listeners = self.state.lock().exit_listeners.clone();
        for listener in &listeners {
            listener(ProcessHandle::new(run_id, None), code);
        }
    }

    /// Every line sent while running, oldest first
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Number of successful `start` calls
    pub fn start_count(&self) -> u64 {
        self.state.lock().runs
    }

    /// Number of `stop` calls that found a running process
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    /// Registered (line, exit) listener counts
    pub fn listener_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.line_listeners.len(), state.exit_listeners.len())
    }
}

#[async_trait]
impl LineTransport for MockTransport {
    async fn start(&self) -> Result<ProcessHandle> {
        let delay = self.state.lock().start_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_spawn {
            return Err(TransportError::Spawn {
                executable: "mock-engine".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        if state.running {
            return Err(TransportError::AlreadyRunning);
        }
        state.running = true;
        state.runs += 1;
        state.framer = LineFramer::new();
        Ok(ProcessHandle::new(state.runs, None))
    }

    fn send(&self, line: &str) {
        let replies = {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            state.sent.push(line.to_string());
            let command = line.split_whitespace().next().unwrap_or_default();
            state.replies.get(command).cloned().unwrap_or_default()
        };
        for reply in replies {
            self.emit_line(&reply);
        }
    }

    fn on_line(&self, listener: LineListener) {
        self.state.lock().line_listeners.push(listener);
    }

    fn on_exit(&self, listener: ExitListener) {
        self.state.lock().exit_listeners.push(listener);
    }

    async fn stop(&self) -> Result<()> {
        let (run, listeners) = {
            let mut state = self.state.lock();
            if !state.running {
                return Ok(());
            }
            state.running = false;
            state.stops += 1;
            (state.runs, state.exit_listeners.clone())
        };
        for listener in &listeners {
            listener(ProcessHandle::new(run, None), Some(0));
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}
