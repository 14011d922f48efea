use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::WalletError;
use crate::models::{validate_amount, OperationKind};
use crate::store::WalletStore;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WalletOperationRequest {
    pub operation_type: OperationKind,
    /// Accepts a JSON number or a decimal string.
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub wallet_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub wallet_id: String,
    pub operation_type: OperationKind,
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub message: String,
}

/// Current balance of a wallet.
pub async fn get_wallet<S: WalletStore>(
    Path(wallet_id): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<WalletResponse>, WalletError> {
    let wallet = state
        .balance_service
        .get_wallet(&wallet_id)
        .await?
        .ok_or(WalletError::WalletNotFound(wallet_id))?;

    Ok(Json(WalletResponse {
        wallet_id: wallet.id,
        balance: wallet.balance,
    }))
}

/// Deposit into or withdraw from a wallet. A deposit to an unknown id creates it.
pub async fn perform_operation<S: WalletStore>(
    Path(wallet_id): Path<String>,
    State(state): State<AppState<S>>,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<OperationResponse>, Response> {
    let amount = validate_amount(payload.amount).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": e.to_string(), "code": "VALIDATION_ERROR"})),
        )
            .into_response()
    })?;

    let wallet = state
        .balance_service
        .apply_operation(&wallet_id, payload.operation_type, amount)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(OperationResponse {
        wallet_id: wallet.id,
        operation_type: payload.operation_type,
        amount,
        new_balance: wallet.balance,
        message: "Operation successful".to_string(),
    }))
}
