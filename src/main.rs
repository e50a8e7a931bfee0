//! Couple It · daily poem word-guessing backend
//!
//! - Axum HTTP + WebSocket API
//! - Dictionary/rhyme lookups over HTTP, or a local word list
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   GAME_CONFIG_PATH : path to TOML config (rules, lexicon, content, storage)
//!   POEMS_URL        : remote JSON collection of daily puzzles (read-only)
//!   POEMS_PATH       : local JSON collection of daily puzzles (admin-writable)
//!   DATA_DIR         : directory for per-player records (in memory if unset)
//!   GAME_TODAY       : pin "today" to a YYYYMMDD key (testing)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod domain;
mod poem;
mod config;
mod seeds;
mod lexicon;
mod evaluator;
mod round;
mod store;
mod content;
mod share;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config, lexicon, content source and player storage.
  let state = Arc::new(AppState::new());

  // A failed first load keeps serving (seed fallback or 404s) until /revalidate.
  match state.content.refresh().await {
    Ok(n) => info!(target: "couple_it", puzzles = n, "Puzzle collection loaded"),
    Err(e) => warn!(target: "couple_it", error = %e, "Puzzle collection not loaded"),
  }

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "couple_it", %addr, today = %state.today(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "couple_it", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "couple_it", error = %e, "Cannot listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "couple_it", "Shutdown requested");
}
