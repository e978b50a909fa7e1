//! Line protocol vocabulary for UCI-style engine processes
//!
//! This crate knows what the engine's text protocol looks like, but not how
//! bytes get to and from the process. It provides:
//!
//! - **ProtocolConfig**: the handshake, search, context and quit commands
//! - **SearchParams**: search limits rendered into the search command
//! - **LineKind**: a classifier turning one protocol line into a tagged variant
//!
//! # Usage
//!
//! ```
//! use ucibridge_protocol::{LineKind, ProtocolConfig, SearchParams};
//!
//! let protocol = ProtocolConfig::default();
//! assert_eq!(protocol.search_line(&SearchParams::depth(2)), "go depth 2");
//!
//! match LineKind::classify("bestmove e2e4 ponder e7e5", &protocol) {
//!     LineKind::SearchAnswer(answer) => assert_eq!(answer.best.as_deref(), Some("e2e4")),
//!     other => panic!("unexpected line kind: {:?}", other),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod line;
pub mod search;

// Re-export commonly used types
pub use config::ProtocolConfig;
pub use error::{ProtocolError, Result};
pub use line::{Answer, LineKind};
pub use search::SearchParams;
