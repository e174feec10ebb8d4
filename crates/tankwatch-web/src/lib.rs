//! tankwatch-web - HTTP API for tankwatch using Axum

pub mod api;
pub mod router;
pub mod sse;

pub use router::{AppState, create_router};

use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server until Ctrl-C
pub async fn run(state: AppState, port: u16) -> Result<()> {
    let router = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Web server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
