//! Liveness endpoint for the hosting platform's port scan.
//!
//! `GET /` answers with a fixed body; nothing else is routed. It shares no
//! state with the bot.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::info;

pub const ALIVE_BODY: &str = "winbot is alive ✅";

pub fn router() -> Router {
    Router::new().route("/", get(root))
}

async fn root() -> &'static str {
    ALIVE_BODY
}

/// Bind `0.0.0.0:<port>` and serve until the process exits.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("liveness endpoint listening on {addr}");
    axum::serve(listener, router()).await?;
    Ok(())
}
