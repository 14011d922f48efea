use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures raised by a wallet store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Timed out waiting for the lock on wallet {wallet_id}")]
    LockTimeout { wallet_id: String },
}

/// Every way a wallet operation can fail. Callers branch on the variant,
/// never on the message text.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet with id {0} not found")]
    WalletNotFound(String),

    #[error("Insufficient funds for withdrawal: balance {balance}, requested {requested}")]
    InsufficientFunds {
        wallet_id: String,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl WalletError {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            WalletError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WalletError::InvalidOperation(_) => "INVALID_OPERATION",
            WalletError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WalletError::WalletNotFound(_) => StatusCode::NOT_FOUND,
            WalletError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            WalletError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            WalletError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WalletError {
    fn into_response(self) -> Response {
        // Driver details stay in the logs.
        let message = match &self {
            WalletError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status_code(),
            Json(serde_json::json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
