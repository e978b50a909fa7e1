//! Child process transport
//!
//! Spawns the engine executable and speaks to it over stdin/stdout.

pub mod config;
pub mod transport;

pub use config::ProcessConfig;
pub use transport::ProcessTransport;
