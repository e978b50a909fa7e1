//! Protocol configuration
//!
//! The engine protocol is not hard-coded: the handshake pair, the search and
//! context commands, the answer keyword and the quit command all come from
//! [`ProtocolConfig`]. The defaults speak UCI.

use crate::error::{ProtocolError, Result};
use crate::search::SearchParams;
use serde::{Deserialize, Serialize};

/// Commands and tokens that make up the engine's line protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Command sent right after spawning the process
    pub init_command: String,

    /// Line the process emits once it is ready to accept commands
    pub ready_terminator: String,

    /// Command prefix used to set the position/context for the next search
    pub context_command: String,

    /// Command keyword that starts a search
    pub search_command: String,

    /// First token of the line that ends a search and carries its answer
    pub answer_prefix: String,

    /// Command asking the process to exit, if the protocol has one
    pub quit_command: Option<String>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            init_command: "uci".to_string(),
            ready_terminator: "uciok".to_string(),
            context_command: "position fen".to_string(),
            search_command: "go".to_string(),
            answer_prefix: "bestmove".to_string(),
            quit_command: Some("quit".to_string()),
        }
    }
}

impl ProtocolConfig {
    /// Set the handshake command and the line that terminates it
    pub fn with_handshake(
        mut self,
        init_command: impl Into<String>,
        ready_terminator: impl Into<String>,
    ) -> Self {
        self.init_command = init_command.into();
        self.ready_terminator = ready_terminator.into();
        self
    }

    /// Set the context command prefix
    pub fn with_context_command(mut self, command: impl Into<String>) -> Self {
        self.context_command = command.into();
        self
    }

    /// Set the search command keyword
    pub fn with_search_command(mut self, command: impl Into<String>) -> Self {
        self.search_command = command.into();
        self
    }

    /// Set the answer line keyword
    pub fn with_answer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.answer_prefix = prefix.into();
        self
    }

    /// Set or clear the quit command
    pub fn with_quit_command(mut self, command: Option<String>) -> Self {
        self.quit_command = command;
        self
    }

    /// Check that the configuration can detect a handshake and an answer
    ///
    /// # Errors
    ///
    /// Returns an error if a required command is empty or if the answer
    /// prefix is not a single whitespace-free token.
    pub fn validate(&self) -> Result<()> {
        if self.init_command.trim().is_empty() {
            return Err(ProtocolError::EmptyField("init_command"));
        }
        if self.ready_terminator.trim().is_empty() {
            return Err(ProtocolError::EmptyField("ready_terminator"));
        }
        if self.search_command.trim().is_empty() {
            return Err(ProtocolError::EmptyField("search_command"));
        }
        if self.answer_prefix.is_empty() {
            return Err(ProtocolError::EmptyField("answer_prefix"));
        }
        if self.answer_prefix.split_whitespace().count() != 1
            || self.answer_prefix.trim() != self.answer_prefix
        {
            return Err(ProtocolError::NotAToken {
                field: "answer_prefix",
                value: self.answer_prefix.clone(),
            });
        }
        Ok(())
    }

    /// Render the command that sets the search context
    pub fn context_line(&self, descriptor: &str) -> String {
        format!("{} {}", self.context_command, descriptor.trim())
    }

    /// Render the command that starts a search
    pub fn search_line(&self, params: &SearchParams) -> String {
        let mut line = self.search_command.clone();
        for arg in params.arguments() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}
