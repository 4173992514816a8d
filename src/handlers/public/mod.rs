// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Routes: GET /, GET /health

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::ratings::RatingStore;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "data": {
            "name": "Bookshelf API",
            "version": version,
            "description": "Book catalog with per-user star ratings",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "book": "/c/book/:book_id (protected)",
                "rating": "/c/book/:book_id/rating [GET, POST, PUT, DELETE] (protected)",
            }
        }
    }))
}

/// GET /health - store reachability
pub async fn health<S: RatingStore>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError> {
    state.ratings.health_check().await.map_err(|e| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(Json(json!({
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}
