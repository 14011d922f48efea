use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{WalletStore, WalletTransaction};
use crate::errors::StoreError;
use crate::models::Wallet;

/// In-process wallet store for local runs and tests.
///
/// Committed balances live in one map; every wallet id (present or not) has its
/// own exclusive lock. A transaction keeps the guards for the ids it locked and
/// buffers writes until commit, so locking an absent id serializes creation.
/// A lock entry lives only while some transaction holds or awaits it.
#[derive(Clone)]
pub struct MemoryWalletStore {
    inner: Arc<Inner>,
}

struct Inner {
    committed: RwLock<HashMap<String, Decimal>>,
    // Never held across an await.
    row_locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
    lock_timeout: Duration,
}

impl Inner {
    fn row_locks(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.row_locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the entry for `wallet_id` once the map holds the only reference.
    fn prune(row_locks: &mut HashMap<String, Arc<Mutex<()>>>, wallet_id: &str) {
        if row_locks
            .get(wallet_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            row_locks.remove(wallet_id);
        }
    }
}

impl MemoryWalletStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                committed: RwLock::new(HashMap::new()),
                row_locks: std::sync::Mutex::new(HashMap::new()),
                lock_timeout,
            }),
        }
    }

    /// Number of committed wallet rows.
    pub async fn len(&self) -> usize {
        self.inner.committed.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids that currently have a row lock entry.
    pub fn lock_entries(&self) -> usize {
        self.inner.row_locks().len()
    }
}

impl Default for MemoryWalletStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    type Tx = MemoryWalletTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(MemoryWalletTransaction {
            store: self.inner.clone(),
            held: HashMap::new(),
            pending: HashMap::new(),
        })
    }

    async fn get(&self, wallet_id: &str) -> Result<Option<Wallet>, StoreError> {
        let committed = self.inner.committed.read().await;
        Ok(committed
            .get(wallet_id)
            .map(|balance| Wallet::new(wallet_id, *balance)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemoryWalletTransaction {
    store: Arc<Inner>,
    held: HashMap<String, OwnedMutexGuard<()>>,
    pending: HashMap<String, Decimal>,
}

impl MemoryWalletTransaction {
    async fn lock(&mut self, wallet_id: &str) -> Result<(), StoreError> {
        if self.held.contains_key(wallet_id) {
            return Ok(());
        }

        let row_lock = self
            .store
            .row_locks()
            .entry(wallet_id.to_string())
            .or_default()
            .clone();

        let acquired = tokio::time::timeout(self.store.lock_timeout, row_lock.lock_owned()).await;
        match acquired {
            Ok(guard) => {
                self.held.insert(wallet_id.to_string(), guard);
                Ok(())
            }
            Err(_) => {
                Inner::prune(&mut self.store.row_locks(), wallet_id);
                Err(StoreError::LockTimeout {
                    wallet_id: wallet_id.to_string(),
                })
            }
        }
    }

    async fn current(&self, wallet_id: &str) -> Option<Decimal> {
        if let Some(balance) = self.pending.get(wallet_id) {
            return Some(*balance);
        }
        self.store.committed.read().await.get(wallet_id).copied()
    }
}

impl Drop for MemoryWalletTransaction {
    fn drop(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let mut row_locks = self.store.row_locks();
        for (wallet_id, guard) in self.held.drain() {
            drop(guard);
            Inner::prune(&mut row_locks, &wallet_id);
        }
    }
}

#[async_trait]
impl WalletTransaction for MemoryWalletTransaction {
    async fn find(
        &mut self,
        wallet_id: &str,
        lock_for_update: bool,
    ) -> Result<Option<Wallet>, StoreError> {
        if lock_for_update {
            self.lock(wallet_id).await?;
        }
        Ok(self
            .current(wallet_id)
            .await
            .map(|balance| Wallet::new(wallet_id, balance)))
    }

    async fn create(&mut self, wallet_id: &str) -> Result<Wallet, StoreError> {
        self.lock(wallet_id).await?;

        if let Some(balance) = self.current(wallet_id).await {
            return Ok(Wallet::new(wallet_id, balance));
        }

        let wallet = Wallet::empty(wallet_id);
        self.pending.insert(wallet.id.clone(), wallet.balance);
        Ok(wallet)
    }

    async fn update_balance(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        self.lock(&wallet.id).await?;
        self.pending.insert(wallet.id.clone(), wallet.balance);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            let mut committed = self.store.committed.write().await;
            committed.extend(self.pending.drain());
        }
        // Row guards drop here, after the writes are visible.
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
