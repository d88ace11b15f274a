use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::auth::CallerIdentity;
use crate::core::{AccountProfile, AccountSummary, EntityId};
use crate::error::AppResult;
use crate::services::ProfileUpdate;

use super::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", put(update_profile))
        .route("/{username}", get(get_profile))
        .route("/{id}/follow", post(follow).delete(unfollow))
        .route("/{id}/followers", get(list_followers))
        .route("/{id}/following", get(list_following))
}

#[derive(Debug, Serialize)]
struct Ack {
    message: &'static str,
}

async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<AccountProfile>>> {
    let profile = state.accounts.profile(&username).await?;
    Ok(ApiResponse::ok(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<ProfileUpdate>,
) -> AppResult<Json<ApiResponse<AccountProfile>>> {
    let profile = state
        .accounts
        .update_profile(caller.account_id, request)
        .await?;
    Ok(ApiResponse::ok(profile))
}

async fn follow(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(target): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    state.follow_graph.follow(caller.account_id, target).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Successfully followed user",
    }))
}

async fn unfollow(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(target): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    state.follow_graph.unfollow(caller.account_id, target).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Successfully unfollowed user",
    }))
}

async fn list_followers(
    State(state): State<AppState>,
    Path(account_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Vec<AccountSummary>>>> {
    let followers = state.follow_graph.list_followers(account_id).await?;
    Ok(ApiResponse::ok(followers))
}

async fn list_following(
    State(state): State<AppState>,
    Path(account_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Vec<AccountSummary>>>> {
    let following = state.follow_graph.list_following(account_id).await?;
    Ok(ApiResponse::ok(following))
}
