//! Root endpoint

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// `GET /`
pub async fn handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Hello World",
    })
}
