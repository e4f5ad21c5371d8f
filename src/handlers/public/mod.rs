// handlers/public/mod.rs - Public handlers (no authentication required)

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

pub mod auth;
pub mod profile;

/// GET / - Service banner and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "DevConnector API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/auth (public login, protected lookup)",
            "profile": "/api/profile[/user/:user_id] (public reads, protected writes)",
            "posts": "/api/posts[/:id] (protected)",
        }
    }))
}

/// GET /health - Liveness plus a store round trip
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.store.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Store unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": "ok"
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;
    use crate::config::AppConfig;
    use crate::testing::FlakyStore;

    fn state(store: Arc<FlakyStore>) -> AppState {
        AppState::new(AppConfig::development(), store)
    }

    #[tokio::test]
    async fn healthy_store_reports_ok() {
        let Json(body) = health(State(state(Arc::new(FlakyStore::new())))).await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn failed_ping_is_service_unavailable() {
        let store = Arc::new(FlakyStore::new());
        store.fail_pings(true);

        let err = health(State(state(store))).await.unwrap_err();
        assert_eq!(err.to_json(), json!({ "msg": "Store unavailable" }));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
