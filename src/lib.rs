// Library root - exports for the binary and tests

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use errors::{StoreError, WalletError};
pub use models::{OperationKind, Wallet};
pub use services::BalanceService;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use store::WalletStore;

pub struct AppState<S> {
    pub balance_service: Arc<BalanceService<S>>,
}

impl<S: WalletStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            balance_service: Arc::new(BalanceService::new(store)),
        }
    }
}

// Manual impl: the store itself need not be Clone.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            balance_service: self.balance_service.clone(),
        }
    }
}

/// All API routes with CORS and request tracing.
pub fn build_router<S: WalletStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check::<S>))
        .route("/api/v1/wallets/:wallet_id", get(handlers::get_wallet::<S>))
        .route(
            "/api/v1/wallets/:wallet_id/operation",
            post(handlers::perform_operation::<S>),
        )
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
