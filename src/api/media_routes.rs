use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};

use crate::app_state::AppState;
use crate::auth::CallerIdentity;
use crate::error::{AppError, AppResult};
use crate::media::{StoredMedia, MAX_UPLOAD_BYTES};

use super::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_media))
        .route("/profile-picture", post(upload_profile_picture))
        // Multipart framing adds overhead on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
}

async fn upload_media(
    State(state): State<AppState>,
    caller: CallerIdentity,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<StoredMedia>>)> {
    let stored = save_field(&state, caller, multipart, "media").await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(stored)))
}

async fn upload_profile_picture(
    State(state): State<AppState>,
    caller: CallerIdentity,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<StoredMedia>>)> {
    let stored = save_field(&state, caller, multipart, "image").await?;
    if !stored.mimetype.starts_with("image/") {
        return Err(AppError::Validation(
            "Profile picture must be an image".to_string(),
        ));
    }
    Ok((StatusCode::CREATED, ApiResponse::ok(stored)))
}

/// Read the named field out of the multipart body and persist it.
async fn save_field(
    state: &AppState,
    caller: CallerIdentity,
    mut multipart: Multipart,
    field_name: &str,
) -> AppResult<StoredMedia> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .ok_or_else(|| AppError::Validation("Missing content type".to_string()))?
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;

        let stored = state
            .media
            .save(field_name, &original_name, &content_type, &bytes)
            .await?;
        tracing::info!(
            account_id = caller.account_id,
            filename = %stored.filename,
            size = stored.size,
            "stored upload"
        );
        return Ok(stored);
    }

    Err(AppError::Validation(format!(
        "No '{}' file provided",
        field_name
    )))
}
