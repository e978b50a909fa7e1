//! Process transport implementation
//!
//! Each run of the engine gets four tasks:
//!
//! - a **writer** owning stdin, fed by an unbounded channel so `send` never
//!   blocks and commands reach the process in issuance order
//! - a **stdout reader** framing chunks into lines and dispatching them
//!   eagerly to every listener
//! - a **stderr reader** logging diagnostic output
//! - a **supervisor** owning the child, waiting for exit (or a kill
//!   request) and firing exit listeners exactly once

use crate::error::{Result, TransportError};
use crate::framing::LineFramer;
use crate::process::config::ProcessConfig;
use crate::traits::{ExitListener, LineListener, LineTransport, ProcessHandle};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const READ_CHUNK_SIZE: usize = 4096;

/// Upper bound on waiting for stdout to drain once the child has exited
const STDOUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Listeners {
    lines: RwLock<Vec<LineListener>>,
    exits: RwLock<Vec<ExitListener>>,
}

impl Listeners {
    fn dispatch_line(&self, line: &str) {
        let listeners = self.lines.read().clone();
        for listener in &listeners {
            listener(line);
        }
    }

    fn dispatch_exit(&self, handle: ProcessHandle, code: Option<i32>) {
        let listeners = self.exits.read().clone();
        for listener in &listeners {
            listener(handle, code);
        }
    }
}

/// Per-run state, present only while the process runs
struct RunningProcess {
    run_id: u64,
    stdin: mpsc::UnboundedSender<String>,
    kill: oneshot::Sender<()>,
    exited: watch::Receiver<bool>,
}

/// Transport over a tokio child process
///
/// Dropping the transport kills a still-running process.
pub struct ProcessTransport {
    config: ProcessConfig,
    listeners: Arc<Listeners>,
    running: Arc<Mutex<Option<RunningProcess>>>,
    runs: AtomicU64,
}

impl ProcessTransport {
    /// Create a transport; nothing is spawned until `start`
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            listeners: Arc::new(Listeners::default()),
            running: Arc::new(Mutex::new(None)),
            runs: AtomicU64::new(0),
        }
    }

    /// Get the process configuration
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.executable);
        cmd.args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl LineTransport for ProcessTransport {
    async fn start(&self) -> Result<ProcessHandle> {
        let already_running = self.running.lock().is_some();
        if already_running {
            return Err(TransportError::AlreadyRunning);
        }

        let mut child = self
            .command()
            .spawn()
            .map_err(|source| TransportError::Spawn {
                executable: self.config.executable.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stderr".to_string()))?;

        let run_id = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let pid = child.id();
        let handle = ProcessHandle::new(run_id, pid);
        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = watch::channel(false);

        // Publish the run before any task can observe an exit
        {
            let mut running = self.running.lock();
            if running.is_some() {
                // Lost a race with a concurrent start; `child` is killed on drop
                return Err(TransportError::AlreadyRunning);
            }
            *running = Some(RunningProcess {
                run_id,
                stdin: stdin_tx,
                kill: kill_tx,
                exited: exited_rx,
            });
        }

        tokio::spawn(write_stdin(stdin, stdin_rx));
        tokio::spawn(log_stderr(stderr, run_id));
        let stdout_task = tokio::spawn(read_stdout(stdout, Arc::clone(&self.listeners)));
        tokio::spawn(supervise(
            child,
            kill_rx,
            stdout_task,
            Supervision {
                handle,
                listeners: Arc::clone(&self.listeners),
                running: Arc::clone(&self.running),
                exited: exited_tx,
            },
        ));

        info!(run_id, ?pid, executable = %self.config.executable, "engine process spawned");
        Ok(handle)
    }

    fn send(&self, line: &str) {
        let running = self.running.lock();
        match running.as_ref() {
            Some(run) => {
                if run.stdin.send(line.to_string()).is_err() {
                    debug!(command = %line, "engine stdin closed, command dropped");
                }
            }
            None => debug!(command = %line, "no engine process, command dropped"),
        }
    }

    fn on_line(&self, listener: LineListener) {
        self.listeners.lines.write().push(listener);
    }

    fn on_exit(&self, listener: ExitListener) {
        self.listeners.exits.write().push(listener);
    }

    async fn stop(&self) -> Result<()> {
        let run = self.running.lock().take();
        let Some(RunningProcess {
            run_id,
            stdin,
            kill,
            mut exited,
        }) = run
        else {
            debug!("stop requested with no engine process running");
            return Ok(());
        };

        // Closing the channel lets the writer flush what is queued, then closes stdin
        drop(stdin);

        let graceful = tokio::time::timeout(self.config.shutdown_grace, wait_for_exit(&mut exited))
            .await
            .is_ok();
        if !graceful {
            debug!(run_id, "engine did not exit within grace period, killing");
            let _ = kill.send(());
            wait_for_exit(&mut exited).await;
        }

        info!(run_id, graceful, "engine process stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}

async fn wait_for_exit(exited: &mut watch::Receiver<bool>) {
    // A dropped sender means the supervisor is gone, and the child with it
    let _ = exited.wait_for(|done| *done).await;
}

async fn write_stdin(stdin: ChildStdin, mut commands: mpsc::UnboundedReceiver<String>) {
    let mut writer = BufWriter::new(stdin);
    while let Some(line) = commands.recv().await {
        debug!(command = %line, "> engine");
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        if let Err(e) = written.await {
            debug!(error = %e, "engine stdin no longer writable");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn read_stdout(mut stdout: ChildStdout, listeners: Arc<Listeners>) {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in framer.push(&buf[..n]) {
                    debug!(line = %line, "< engine");
                    listeners.dispatch_line(&line);
                }
            }
            Err(e) => {
                warn!(error = %e, "failed reading engine stdout");
                break;
            }
        }
    }
    if let Some(line) = framer.finish() {
        debug!(line = %line, "< engine");
        listeners.dispatch_line(&line);
    }
}

async fn log_stderr(stderr: ChildStderr, run_id: u64) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if !line.is_empty() {
            warn!(run_id, "engine stderr: {}", line);
        }
    }
}

struct Supervision {
    handle: ProcessHandle,
    listeners: Arc<Listeners>,
    running: Arc<Mutex<Option<RunningProcess>>>,
    exited: watch::Sender<bool>,
}

async fn supervise(
    mut child: Child,
    kill: oneshot::Receiver<()>,
    stdout_task: JoinHandle<()>,
    supervision: Supervision,
) {
    let Supervision {
        handle,
        listeners,
        running,
        exited,
    } = supervision;
    let run_id = handle.run_id();

    // A dropped kill sender (transport dropped) also kills the child
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill => {
            if let Err(e) = child.start_kill() {
                warn!(run_id, error = %e, "failed to kill engine process");
            }
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(run_id, error = %e, "failed to collect engine exit status");
            None
        }
    };

    // Deliver trailing output before announcing the exit
    if tokio::time::timeout(STDOUT_DRAIN_TIMEOUT, stdout_task)
        .await
        .is_err()
    {
        warn!(run_id, "engine stdout still open after exit");
    }

    {
        let mut slot = running.lock();
        if slot.as_ref().is_some_and(|run| run.run_id == run_id) {
            *slot = None;
        }
    }

    info!(run_id, ?code, "engine process exited");
    listeners.dispatch_exit(handle, code);
    let _ = exited.send(true);
}
