// REST API surface - routers, the response envelope, and request/response
// DTOs. Handlers translate HTTP onto the service layer and nothing else.

pub mod account_routes;
pub mod auth_routes;
pub mod media_routes;
pub mod post_routes;

use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::app_state::AppState;
use crate::core::current_time_millis;

/// Uniform response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

/// Assemble the full application router
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.media.upload_dir());

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth_routes::router())
        .nest("/api/users", account_routes::router())
        .nest("/api/posts", post_routes::router())
        .nest("/api/media", media_routes::router())
        .nest_service("/uploads", uploads)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "stagedoor",
        "timestamp": current_time_millis()
    }))
}
