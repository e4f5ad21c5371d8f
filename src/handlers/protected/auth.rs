use axum::{extract::State, response::Json};

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::PublicUser;

/// GET /api/auth - The authenticated user, without credentials
pub async fn current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.accounts.current_user(&identity).await?))
}
