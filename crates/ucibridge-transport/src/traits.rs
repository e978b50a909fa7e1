//! Transport trait
//!
//! Defines the line transport contract a protocol session is written
//! against, so the session can run over a real child process or any other
//! implementation (a scripted mock in tests, for instance).

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Listener invoked once per complete line, in arrival order
pub type LineListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Listener invoked once per process run with that run's handle and its
/// exit code, if any
///
/// Exits can be reported after a newer run has started; the handle tells
/// the listener which run ended.
pub type ExitListener = Arc<dyn Fn(ProcessHandle, Option<i32>) + Send + Sync>;

/// Identifies one run of the child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    run_id: u64,
    pid: Option<u32>,
}

impl ProcessHandle {
    /// Create a handle for a run
    pub fn new(run_id: u64, pid: Option<u32>) -> Self {
        Self { run_id, pid }
    }

    /// Sequence number of this run; increases with every `start`
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// OS process id, when the platform reports one
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Line-oriented, bidirectional transport to a child process
///
/// Listeners are broadcast: every registered line listener sees every line.
/// They stay registered across restarts.
#[async_trait]
pub trait LineTransport: Send + Sync {
    /// Spawn the process and begin reading its output
    async fn start(&self) -> Result<ProcessHandle>;

    /// Write `line` plus a newline to the process input
    ///
    /// Never blocks. Silently does nothing when the input stream is not
    /// writable.
    fn send(&self, line: &str);

    /// Register a line listener
    fn on_line(&self, listener: LineListener);

    /// Register an exit listener
    fn on_exit(&self, listener: ExitListener);

    /// Shut the process down; no effect if it is not running
    async fn stop(&self) -> Result<()>;

    /// Whether a process is currently running
    fn is_running(&self) -> bool;
}
