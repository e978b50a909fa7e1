//! Configuration for spawning an engine process

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for spawning an engine process
#[derive(Clone, Debug)]
pub struct ProcessConfig {
    /// Path to the engine executable
    pub executable: String,

    /// Arguments to pass to the executable
    pub args: Vec<String>,

    /// Extra environment variables, added on top of the inherited environment
    pub env: HashMap<String, String>,

    /// Working directory for the process
    pub working_dir: Option<PathBuf>,

    /// How long `stop` waits for a voluntary exit before killing
    pub shutdown_grace: Duration,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            executable: "stockfish".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            shutdown_grace: Duration::from_millis(200),
        }
    }
}

impl ProcessConfig {
    /// Create a new process configuration
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the shutdown grace period
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
