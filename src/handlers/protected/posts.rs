use std::collections::VecDeque;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::handlers::{parse_id, JsonBody};
use crate::models::{Comment, CommentInput, Like, Post, PostInput};

const POST_NOT_FOUND: &str = "Post not found";

/// POST /api/posts
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(input): JsonBody<PostInput>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.posts.create(&identity, input).await?))
}

/// GET /api/posts - Newest first
pub async fn list(State(state): State<AppState>, _identity: Identity) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list().await?))
}

/// GET /api/posts/:id
pub async fn get(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.get(id).await?))
}

/// DELETE /api/posts/:id - Author only
pub async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    state.posts.delete(&identity, id).await?;
    Ok(Json(json!({ "msg": "Post removed" })))
}

/// PUT /api/posts/like/:id - Returns the post's likes
pub async fn like(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<VecDeque<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.like(&identity, id).await?))
}

/// PUT /api/posts/unlike/:id - Returns the post's likes
pub async fn unlike(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<VecDeque<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.unlike(&identity, id).await?))
}

/// POST /api/posts/comment/:id - Returns the post's comments
pub async fn comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CommentInput>,
) -> Result<Json<VecDeque<Comment>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.comment(&identity, id, input).await?))
}

/// DELETE /api/posts/comment/:id/:comment_id - Comment author only
pub async fn uncomment(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<VecDeque<Comment>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, "Comment does not exist")?;
    Ok(Json(state.posts.uncomment(&identity, id, comment_id).await?))
}
