//! Server state and configuration.

use std::sync::Arc;

use crate::{printer::Transport, raster::Rasterizer};

/// Port the agent has always listened on.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9000";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:9000")
    pub listen_addr: String,
    /// Label geometry and threshold applied to every uploaded image
    pub rasterizer: Rasterizer,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            rasterizer: Rasterizer::default(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(config: ServerConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }
}
