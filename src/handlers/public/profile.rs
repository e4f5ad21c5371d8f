use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::parse_id;

/// GET /api/profile - Every profile, owners populated
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.profiles.list().await?))
}

/// GET /api/profile/user/:user_id - One user's profile
pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_id(&user_id, "Profile not found")?;
    Ok(Json(state.profiles.by_user(user_id).await?))
}
