use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::time::Duration;

use super::{WalletStore, WalletTransaction};
use crate::database::DatabasePool;
use crate::errors::StoreError;
use crate::models::Wallet;

// SQLSTATE lock_not_available, raised when lock_timeout expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: String,
    balance: Decimal,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Wallet::new(row.id, row.balance)
    }
}

/// Wallet rows in PostgreSQL. Locks are `SELECT ... FOR UPDATE` row locks, so
/// several service instances can share one database.
#[derive(Clone)]
pub struct PgWalletStore {
    pool: DatabasePool,
    lock_timeout: Duration,
}

impl PgWalletStore {
    pub fn new(pool: DatabasePool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    type Tx = PgWalletTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let mut tx = self.pool.begin().await?;

        // SET does not take bind parameters; the value is an integer we format ourselves.
        // Postgres reads 0 as "no timeout", so never send less than 1ms.
        let set_timeout = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis().max(1)
        );
        sqlx::query(&set_timeout).execute(&mut *tx).await?;

        Ok(PgWalletTransaction { tx })
    }

    async fn get(&self, wallet_id: &str) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT id, balance FROM wallets WHERE id = $1"
        )
        .bind(wallet_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(Wallet::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }
}

pub struct PgWalletTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WalletTransaction for PgWalletTransaction {
    async fn find(
        &mut self,
        wallet_id: &str,
        lock_for_update: bool,
    ) -> Result<Option<Wallet>, StoreError> {
        let sql = if lock_for_update {
            "SELECT id, balance FROM wallets WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT id, balance FROM wallets WHERE id = $1"
        };

        let row = sqlx::query_as::<_, WalletRow>(sql)
            .bind(wallet_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, wallet_id))?;

        Ok(row.map(Wallet::from))
    }

    async fn create(&mut self, wallet_id: &str) -> Result<Wallet, StoreError> {
        // A concurrent creator's uncommitted insert makes this block on the
        // primary key; once it commits, ON CONFLICT turns ours into a no-op and
        // the locking re-read below sees the committed row.
        sqlx::query(
            r#"
            INSERT INTO wallets (id, balance)
            VALUES ($1, 0.00)
            ON CONFLICT (id) DO NOTHING
            "#
        )
        .bind(wallet_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| classify(e, wallet_id))?;

        self.find(wallet_id, true)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_balance(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        sqlx::query("UPDATE wallets SET balance = $1 WHERE id = $2")
            .bind(wallet.balance)
            .bind(&wallet.id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, &wallet.id))?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn classify(err: sqlx::Error, wallet_id: &str) -> StoreError {
    let lock_timed_out = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == LOCK_NOT_AVAILABLE)
        .unwrap_or(false);

    if lock_timed_out {
        StoreError::LockTimeout {
            wallet_id: wallet_id.to_string(),
        }
    } else {
        StoreError::Database(err)
    }
}
