//! VietVibe · Quiz Session Service
//!
//! - Axum HTTP + WebSocket API driving quiz play-throughs
//! - VietVibe REST upstream for game definitions and point records
//! - Local game bank (TOML + built-in demo games) when no upstream is set
//!
//! Important env variables:
//!   PORT                      : u16 (default 3000)
//!   VIETVIBE_API_BASE_URL     : enables the VietVibe upstream
//!   VIETVIBE_API_TIMEOUT_SECS : upstream request timeout (default 15)
//!   QUIZ_CONFIG_PATH          : path to TOML config (upstream, scoring, local games)
//!   LOG_LEVEL                 : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod loader;
mod upstream;
mod evaluator;
mod session;
mod finalizer;
mod state;
mod protocol;
mod logic;
mod routes;

#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (session store, local bank, upstream client).
  let state = Arc::new(AppState::from_env());
  if state.scoring.session_ttl_secs > 0 {
    state.clone().spawn_session_sweeper(Duration::from_secs(state.scoring.session_ttl_secs));
  }

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "vietvibe_quiz", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "vietvibe_quiz", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "vietvibe_quiz", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
