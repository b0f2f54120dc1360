// src/server/mod.rs

//! Development server: static files from the output root plus live reload.

pub mod inject;
pub mod livereload;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::Result;

pub use inject::inject_script;
pub use livereload::{LiveReload, CLIENT_SCRIPT, CLIENT_SCRIPT_PATH, LIVERELOAD_PATH};

/// Router serving `output_root`, with HTML responses wired for live reload.
///
/// With `source_root`, original sources are also served under `/source/`,
/// which is where source maps point.
pub fn router(output_root: &Path, source_root: Option<&Path>, reload: LiveReload) -> Router {
    let mut app = Router::new()
        .route(LIVERELOAD_PATH, get(livereload::websocket_handler))
        .route(CLIENT_SCRIPT_PATH, get(livereload::client_script));

    if let Some(source_root) = source_root {
        app = app.nest_service("/source", ServeDir::new(source_root));
    }

    app.fallback_service(ServeDir::new(output_root))
        .layer(middleware::from_fn(inject::inject_reload_script))
        .layer(TraceLayer::new_for_http())
        .with_state(reload)
}

/// Bind `host:port` and serve until the process exits.
pub async fn serve(host: &str, port: u16, app: Router) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding dev server to {host}:{port}"))?;
    let addr: SocketAddr = listener.local_addr().context("reading dev server address")?;

    info!(%addr, "dev server listening");
    println!("sitepipe: serving on http://{addr}");

    axum::serve(listener, app)
        .await
        .context("dev server stopped")?;
    Ok(())
}
