use axum::{extract::State, http::StatusCode, response::Json};

use crate::store::WalletStore;
use crate::AppState;

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Wallet API is running"}))
}

/// Reports whether the wallet store is reachable.
pub async fn health_check<S: WalletStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.balance_service.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "healthy", "database": "connected"})),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": e.to_string(),
                })),
            )
        }
    }
}
