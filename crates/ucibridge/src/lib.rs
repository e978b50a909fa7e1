//! Async request/response bridge to UCI-style engine processes
//!
//! Callers ask for "the best move for this position" and await a single
//! answer. Behind that call the session owns the engine process, runs the
//! startup handshake, and correlates each search command with the one line
//! that answers it.
//!
//! # Architecture
//!
//! The bridge is built on three layers:
//!
//! 1. **Protocol Layer** (`ucibridge-protocol`): commands, tokens and line classification
//! 2. **Transport Layer** (`ucibridge-transport`): child process I/O and line framing
//! 3. **Session Layer** (this crate): handshake, one-shot observers, request correlation
//!
//! # Usage Example
//!
//! ```no_run
//! use ucibridge::{EngineSession, SearchParams, SessionConfig};
//!
//! # async fn example() -> ucibridge::Result<()> {
//! let session = EngineSession::new(SessionConfig::new("/usr/bin/stockfish"));
//! session.start().await?;
//!
//! let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
//! let best = session.best_move_for(fen, SearchParams::depth(8)).await?;
//! println!("best move: {}", best);
//!
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Correlation
//!
//! The engine protocol has no request identifiers. A session therefore allows
//! a single outstanding search and recognises its answer by line shape;
//! overlapping requests are rejected rather than queued.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod testing;

// Re-export commonly used types
pub use config::SessionConfig;
pub use error::{BridgeError, ErrorRecovery, Result};
pub use lifecycle::{SessionEvent, StopReason};
pub use session::{EngineSession, SessionState};

pub use ucibridge_protocol::{Answer, LineKind, ProtocolConfig, SearchParams};
pub use ucibridge_transport::{LineTransport, ProcessConfig, ProcessTransport, TransportError};
