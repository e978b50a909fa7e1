//! Process transport for line-oriented engine protocols
//!
//! Owns a child process and its standard streams. Outgoing commands are
//! written as newline-terminated lines; incoming output is reassembled from
//! arbitrary chunks into complete, trimmed lines and broadcast to every
//! registered listener. No protocol semantics live here.
//!
//! # Architecture
//!
//! - **LineTransport trait**: the seam a protocol session is written against
//! - **ProcessTransport**: tokio child process implementation
//! - **LineFramer**: carry-over buffer turning byte chunks into lines
//! - **Error handling**: [`TransportError`] for spawn and I/O failures
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use ucibridge_transport::{LineTransport, ProcessConfig, ProcessTransport};
//!
//! let transport = ProcessTransport::new(ProcessConfig::new("/usr/bin/stockfish"));
//! transport.on_line(Arc::new(|line: &str| println!("engine: {}", line)));
//! transport.start().await?;
//! transport.send("uci");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod framing;
pub mod process;
pub mod traits;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use framing::LineFramer;
pub use process::{ProcessConfig, ProcessTransport};
pub use traits::{ExitListener, LineListener, LineTransport, ProcessHandle};
