use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::CallerIdentity;
use crate::core::EntityId;
use crate::error::AppResult;
use crate::services::feed::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::services::{EnrichedComment, EnrichedPost, LikeOutcome, NewPost};

use super::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/feed", get(feed))
        .route("/user/{username}", get(posts_by_user))
        .route("/{id}", get(get_post).delete(delete_post))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", get(list_comments).post(add_comment))
}

#[derive(Debug, Deserialize)]
struct FeedParams {
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct FeedPayload {
    posts: Vec<EnrichedPost>,
    page: u32,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

#[derive(Debug, Serialize)]
struct Ack {
    message: &'static str,
}

async fn create_post(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<NewPost>,
) -> AppResult<(StatusCode, Json<ApiResponse<EnrichedPost>>)> {
    let created = state.posts.create_post(caller.account_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

async fn feed(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<ApiResponse<FeedPayload>>> {
    // The boundary clamps; the composer itself insists on positive values
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let posts = state.feed.compose_feed(caller.account_id, page, limit).await?;
    Ok(ApiResponse::ok(FeedPayload { posts, page, limit }))
}

async fn posts_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<EnrichedPost>>>> {
    let posts = state.posts.posts_by_username(&username).await?;
    Ok(ApiResponse::ok(posts))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<EnrichedPost>>> {
    let post = state.posts.get_post(post_id).await?;
    Ok(ApiResponse::ok(post))
}

async fn delete_post(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(post_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    state
        .engagement
        .delete_post(post_id, caller.account_id)
        .await?;
    Ok(ApiResponse::ok(Ack {
        message: "Post deleted successfully",
    }))
}

async fn toggle_like(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(post_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<LikeOutcome>>> {
    let outcome = state
        .engagement
        .toggle_like(post_id, caller.account_id)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

async fn add_comment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(post_id): Path<EntityId>,
    Json(request): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<EnrichedComment>>)> {
    let comment = state
        .engagement
        .add_comment(post_id, caller.account_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(comment)))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<EntityId>,
) -> AppResult<Json<ApiResponse<Vec<EnrichedComment>>>> {
    let comments = state.engagement.list_comments(post_id).await?;
    Ok(ApiResponse::ok(comments))
}
