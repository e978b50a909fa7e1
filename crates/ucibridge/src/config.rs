//! Session configuration

use std::time::Duration;
use ucibridge_protocol::{ProtocolConfig, SearchParams};
use ucibridge_transport::ProcessConfig;

/// Configuration for an engine session
///
/// Controls which executable is spawned, how its protocol is spoken, and
/// how long the session waits for the engine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How to spawn the engine process
    pub process: ProcessConfig,

    /// Commands and tokens of the engine protocol
    pub protocol: ProtocolConfig,

    /// How long `start` waits for the handshake terminator
    pub startup_timeout: Duration,

    /// How long a search may run before the session is reset
    ///
    /// `None` waits indefinitely.
    pub request_timeout: Option<Duration>,

    /// Search limits used by callers that have no opinion
    pub default_search: SearchParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            process: ProcessConfig::default(),
            protocol: ProtocolConfig::default(),
            startup_timeout: Duration::from_secs(5),
            request_timeout: None,
            default_search: SearchParams::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given engine executable
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            process: ProcessConfig::new(executable),
            ..Default::default()
        }
    }

    /// Replace the process configuration
    pub fn with_process(mut self, process: ProcessConfig) -> Self {
        self.process = process;
        self
    }

    /// Replace the protocol configuration
    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the startup timeout
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Set a per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the default search limits
    pub fn with_default_search(mut self, params: SearchParams) -> Self {
        self.default_search = params;
        self
    }

    /// Load configuration from environment variables
    ///
    /// This will look for:
    /// - `UCIBRIDGE_ENGINE` for the engine executable
    /// - `UCIBRIDGE_STARTUP_TIMEOUT_MS` for the handshake timeout
    /// - `UCIBRIDGE_REQUEST_TIMEOUT_MS` for the per-request timeout
    /// - `UCIBRIDGE_DEPTH` and `UCIBRIDGE_MOVETIME_MS` for the default search
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        if let Some(engine) = lookup("UCIBRIDGE_ENGINE")
            && !engine.trim().is_empty()
        {
            config.process.executable = engine;
        }

        if let Some(timeout) = millis("UCIBRIDGE_STARTUP_TIMEOUT_MS") {
            config.startup_timeout = timeout;
        }

        if let Some(timeout) = millis("UCIBRIDGE_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Some(timeout);
        }

        if let Some(depth) = lookup("UCIBRIDGE_DEPTH").and_then(|v| v.trim().parse().ok()) {
            config.default_search.depth = Some(depth);
        }

        if let Some(movetime) = lookup("UCIBRIDGE_MOVETIME_MS").and_then(|v| v.trim().parse().ok())
        {
            config.default_search.movetime_ms = Some(movetime);
        }

        config
    }
}
