//! Transactional access to wallet rows.
//!
//! A store hands out transactions. Inside a transaction, `find(.., true)` takes an
//! exclusive lock on the wallet id that is held until `commit` or `rollback`; any
//! other transaction asking for the same lock waits. Dropping a transaction without
//! committing discards its writes and releases its locks.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::Wallet;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryWalletStore, MemoryWalletTransaction};
pub use postgres::{PgWalletStore, PgWalletTransaction};

#[async_trait]
pub trait WalletStore: Send + Sync + 'static {
    type Tx: WalletTransaction;

    /// Open a transaction. Lock waits inside it are bounded by the store's lock timeout.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Single unlocked read, outside any transaction.
    async fn get(&self, wallet_id: &str) -> Result<Option<Wallet>, StoreError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait WalletTransaction: Send {
    /// Look up a wallet. With `lock_for_update` the row lock is held until the
    /// transaction ends. A miss has no side effects.
    async fn find(
        &mut self,
        wallet_id: &str,
        lock_for_update: bool,
    ) -> Result<Option<Wallet>, StoreError>;

    /// Insert a zero-balance wallet as part of this transaction and return it locked.
    /// If a concurrent transaction created the same id first, waits for it and
    /// returns the existing row instead of inserting a duplicate.
    async fn create(&mut self, wallet_id: &str) -> Result<Wallet, StoreError>;

    /// Write the wallet's balance inside this transaction.
    async fn update_balance(&mut self, wallet: &Wallet) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
