use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::models::LoginInput;

/// POST /api/auth - Log in with email and password, returns `{ token }`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> Result<Json<Value>, ApiError> {
    let token = state.accounts.login(input, &state.authenticator).await?;
    Ok(Json(json!({ "token": token })))
}
