//! Engine session for request/response exchanges with an engine process
//!
//! Provides the public API for starting the engine, issuing searches and
//! stopping the engine.
//!
//! # Module Organization
//!
//! - [`state`] - Session state machine
//! - [`observer`] - One-shot line observers
//! - [`core`] - EngineSession struct and lifecycle (start, stop, exit handling)
//! - [`query`] - Context setting and search request correlation
//!
//! # Examples
//!
//! ```no_run
//! # use ucibridge::{EngineSession, SearchParams, SessionConfig};
//! # async fn example() -> ucibridge::Result<()> {
//! let session = EngineSession::new(SessionConfig::new("stockfish"));
//! session.start().await?;
//! session.set_context("8/8/8/8/8/8/6k1/4K2R w K - 0 1")?;
//! let best = session.request_best_move(SearchParams::depth(4)).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod observer;
pub mod query;
pub mod state;

// Re-export public types
pub use self::core::EngineSession;
pub use self::state::SessionState;
