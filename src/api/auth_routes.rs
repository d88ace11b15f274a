use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::CallerIdentity;
use crate::core::AccountProfile;
use crate::error::AppResult;
use crate::services::NewAccount;

use super::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthPayload {
    token: String,
    user: AccountProfile,
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let (user, token) = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(AuthPayload { token, user })))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let (user, token) = state.accounts.login(&request.email, &request.password).await?;
    Ok(ApiResponse::ok(AuthPayload { token, user }))
}

async fn me(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> AppResult<Json<ApiResponse<AccountProfile>>> {
    let profile = state.accounts.current_account(caller.account_id).await?;
    Ok(ApiResponse::ok(profile))
}
