//! Ask an engine for the best move in a position
//!
//! ```text
//! cargo run --example best_move -- [ENGINE] [FEN...]
//! ```
//!
//! The engine defaults to `UCIBRIDGE_ENGINE` (or `stockfish` on the PATH) and
//! the position to the initial one. Set `RUST_LOG=ucibridge=debug` to watch
//! the protocol exchange.

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use ucibridge::{EngineSession, SessionConfig, SessionEvent};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ucibridge=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = SessionConfig::from_env();
    if let Some(engine) = args.next() {
        config.process.executable = engine;
    }
    let fen = {
        let rest: Vec<String> = args.collect();
        if rest.is_empty() {
            START_FEN.to_string()
        } else {
            rest.join(" ")
        }
    };

    let session = EngineSession::new(config.clone());
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::ProcessExited { code } = event {
                tracing::debug!(?code, "engine exited");
            }
        }
    });

    session
        .start()
        .await
        .with_context(|| format!("starting engine '{}'", config.process.executable))?;

    let result = session.best_move_for(&fen, config.default_search).await;
    session.stop().await?;

    let best = result.context("engine did not produce a move")?;
    println!("{}", best);
    Ok(())
}
