// Route handlers, one module per resource.

pub mod analytics;
pub mod comments;
pub mod feed;
pub mod profiles;
pub mod settings;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;

/// Liveness check — always 200, no auth, no store access.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
