//! Print API handler.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Error;

use super::state::AppState;

/// Body of every /print response.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrintResponse {
    fn printed() -> Self {
        Self {
            success: true,
            message: Some("Label printed successfully".to_string()),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

/// POST /print - Decode the raw image body and send it to the printer.
pub async fn print(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PrintResponse>, (StatusCode, Json<PrintResponse>)> {
    let rasterizer = state.config.rasterizer;
    let transport = state.transport.clone();

    // Decoding, resampling and the USB writes all block.
    let print_result = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&body)?;
        let buf = rasterizer.rasterize(&image);
        info!(
            "[print] {}x{} image -> {} byte raster",
            image.width(),
            image.height(),
            buf.len()
        );
        transport.transmit(&buf)
    })
    .await;

    match print_result {
        Ok(Ok(())) => Ok(Json(PrintResponse::printed())),
        Ok(Err(e)) => {
            warn!("[print] {}", e);
            Err((
                status_for(&e),
                Json(PrintResponse::failed(e.to_string())),
            ))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PrintResponse::failed(format!("Task error: {}", e))),
        )),
    }
}

/// Map a failed job to the status returned to the caller.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::DecodeError(_) => StatusCode::BAD_REQUEST,
        e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        e if e.is_transmission() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
