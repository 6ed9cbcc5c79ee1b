//! # HTTP Print Agent
//!
//! Accepts an image over HTTP and prints it on the configured USB printer.
//!
//! ## Usage
//!
//! ```bash
//! label-agent serve --listen 0.0.0.0:9000 --printer 4b43:3538
//! curl --data-binary @label.png http://localhost:9000/print
//! ```
//!
//! Any origin may call the agent, so a web page can print directly.

mod handlers;
mod state;

pub use handlers::status_for;
pub use state::{AppState, ServerConfig, DEFAULT_LISTEN_ADDR};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::post,
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{error::Error, printer::Transport};

/// Largest accepted upload.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the router. Every `OPTIONS` request is answered by the CORS layer
/// without reaching a handler.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/print",
            post(handlers::print).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use label_agent::{server::{serve, ServerConfig}, Config, Printer};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), label_agent::Error> {
/// let printer = Arc::new(Printer::new(Config::default()));
/// serve(ServerConfig::default(), printer).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, transport: Arc<dyn Transport>) -> Result<(), Error> {
    let listen_addr = config.listen_addr.clone();
    let geometry = config.rasterizer.geometry();
    let app = router(Arc::new(AppState::new(config, transport)));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    info!("print agent running on {}", listen_addr);
    info!("label geometry {}x{}", geometry.width, geometry.height);

    axum::serve(listener, app).await?;

    Ok(())
}
