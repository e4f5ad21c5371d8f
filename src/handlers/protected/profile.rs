use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::handlers::{parse_id, JsonBody};
use crate::models::{EducationInput, ExperienceInput, Profile, ProfileInput};

/// GET /api/profile/me
pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.profiles.me(&identity).await?))
}

/// POST /api/profile - Create or update the caller's profile
pub async fn upsert(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(input): JsonBody<ProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.upsert(&identity, input).await?))
}

/// DELETE /api/profile - Delete the caller's posts, profile and account
pub async fn delete_account(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Value>, ApiError> {
    state.accounts.delete_account(&identity).await?;
    Ok(Json(json!({ "msg": "User deleted" })))
}

/// PUT /api/profile/experience
pub async fn add_experience(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(input): JsonBody<ExperienceInput>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.add_experience(&identity, input).await?))
}

/// DELETE /api/profile/experience/:exp_id
pub async fn remove_experience(
    State(state): State<AppState>,
    identity: Identity,
    Path(exp_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let exp_id = parse_id(&exp_id, "Experience not found")?;
    Ok(Json(state.profiles.remove_experience(&identity, exp_id).await?))
}

/// PUT /api/profile/education
pub async fn add_education(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(input): JsonBody<EducationInput>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.add_education(&identity, input).await?))
}

/// DELETE /api/profile/education/:edu_id
pub async fn remove_education(
    State(state): State<AppState>,
    identity: Identity,
    Path(edu_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let edu_id = parse_id(&edu_id, "Education not found")?;
    Ok(Json(state.profiles.remove_education(&identity, edu_id).await?))
}
