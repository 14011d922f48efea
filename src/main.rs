use axum::Router;
use tokio::signal;
use tracing::{error, info};

use wallet_api::config::{Config, StoreBackend};
use wallet_api::store::{MemoryWalletStore, PgWalletStore};
use wallet_api::{build_router, database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_api=debug,tower_http=debug".into())
        )
        .init();

    info!("Starting Wallet API server...");

    let config = Config::from_env()?;
    info!("Configuration loaded (store: {:?})", config.store_backend);

    match config.store_backend {
        StoreBackend::Postgres => {
            let db_pool = database::new_pool(&config).await?;
            info!("Database connection pool created");

            if config.run_migrations {
                database::run_migrations(&db_pool).await?;
            }

            let store = PgWalletStore::new(db_pool.clone(), config.lock_timeout());
            serve(&config, build_router(AppState::new(store))).await?;

            db_pool.close().await;
            info!("Database pool closed");
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory wallet store; balances are lost on exit");
            let store = MemoryWalletStore::new(config.lock_timeout());
            serve(&config, build_router(AppState::new(store))).await?;
        }
    }

    Ok(())
}

async fn serve(config: &Config, app: Router) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    // In-flight requests finish or drop their transactions, which rolls them back.
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
