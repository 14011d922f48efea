//! Deposit/withdraw protocol on top of a `WalletStore`.
//!
//! Each mutation runs in one store transaction: lock the row, create it if a
//! deposit targets an unknown id, check funds, write, commit. Every failure path
//! rolls back first, so a failed call leaves the persisted balance unchanged.

use rust_decimal::Decimal;

use crate::errors::WalletError;
use crate::models::{max_balance, quantize, validate_amount, OperationKind, Wallet};
use crate::store::{WalletStore, WalletTransaction};

pub struct BalanceService<S> {
    store: S,
}

impl<S: WalletStore> BalanceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unlocked balance read.
    pub async fn get_wallet(&self, wallet_id: &str) -> Result<Option<Wallet>, WalletError> {
        Ok(self.store.get(wallet_id).await?)
    }

    /// Apply a deposit or withdrawal and return the wallet with its new balance.
    pub async fn apply_operation(
        &self,
        wallet_id: &str,
        kind: OperationKind,
        amount: Decimal,
    ) -> Result<Wallet, WalletError> {
        let amount = validate_amount(amount)
            .map_err(|e| WalletError::InvalidOperation(e.to_string()))?;

        let mut tx = self.store.begin().await?;

        match mutate(&mut tx, wallet_id, kind, amount).await {
            Ok(wallet) => {
                tx.commit().await?;
                tracing::debug!(
                    wallet_id = %wallet.id,
                    operation = %kind,
                    %amount,
                    new_balance = %wallet.balance,
                    "Wallet operation committed"
                );
                Ok(wallet)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed for wallet {}: {:?}", wallet_id, rollback_err);
                }
                match &err {
                    WalletError::Storage(e) => {
                        tracing::error!("Wallet operation on {} failed: {:?}", wallet_id, e)
                    }
                    other => tracing::warn!(
                        wallet_id,
                        operation = %kind,
                        %amount,
                        "Wallet operation rejected: {}",
                        other
                    ),
                }
                Err(err)
            }
        }
    }
}

async fn mutate<T: WalletTransaction>(
    tx: &mut T,
    wallet_id: &str,
    kind: OperationKind,
    amount: Decimal,
) -> Result<Wallet, WalletError> {
    let mut wallet = match tx.find(wallet_id, true).await? {
        Some(wallet) => wallet,
        // Creation stays under this transaction's lock scope.
        None => match kind {
            OperationKind::Deposit => tx.create(wallet_id).await?,
            OperationKind::Withdraw => {
                return Err(WalletError::WalletNotFound(wallet_id.to_string()))
            }
        },
    };

    let new_balance = match kind {
        OperationKind::Deposit => wallet
            .balance
            .checked_add(amount)
            .filter(|balance| *balance <= max_balance()),
        OperationKind::Withdraw => {
            if wallet.balance < amount {
                return Err(WalletError::InsufficientFunds {
                    wallet_id: wallet.id,
                    balance: wallet.balance,
                    requested: amount,
                });
            }
            wallet.balance.checked_sub(amount)
        }
    };
    wallet.balance = new_balance.map(quantize).ok_or_else(|| {
        WalletError::InvalidOperation(format!(
            "Balance of wallet {} would exceed {}",
            wallet_id,
            max_balance()
        ))
    })?;

    tx.update_balance(&wallet).await?;
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWalletStore;
    use rust_decimal_macros::dec;

    fn service() -> BalanceService<MemoryWalletStore> {
        BalanceService::new(MemoryWalletStore::default())
    }

    #[tokio::test]
    async fn deposit_creates_unknown_wallet() {
        let service = service();
        let wallet = service
            .apply_operation("w1", OperationKind::Deposit, dec!(1000.50))
            .await
            .unwrap();
        assert_eq!(wallet.balance, dec!(1000.50));
        assert_eq!(wallet.balance.to_string(), "1000.50");
    }

    #[tokio::test]
    async fn too_precise_amount_is_invalid_operation() {
        let service = service();
        let err = service
            .apply_operation("w", OperationKind::Deposit, dec!(1.001))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidOperation(_)));
        assert!(service.get_wallet("w").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_positive_amount_is_invalid_operation() {
        let service = service();
        for amount in [Decimal::ZERO, dec!(-5.00)] {
            let err = service
                .apply_operation("w", OperationKind::Deposit, amount)
                .await
                .unwrap_err();
            assert!(matches!(err, WalletError::InvalidOperation(_)));
        }
    }

    #[tokio::test]
    async fn insufficient_funds_reports_balance_and_request() {
        let service = service();
        service
            .apply_operation("w", OperationKind::Deposit, dec!(300.00))
            .await
            .unwrap();
        let err = service
            .apply_operation("w", OperationKind::Withdraw, dec!(500.00))
            .await
            .unwrap_err();
        match err {
            WalletError::InsufficientFunds { wallet_id, balance, requested } => {
                assert_eq!(wallet_id, "w");
                assert_eq!(balance, dec!(300.00));
                assert_eq!(requested, dec!(500.00));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn amount_beyond_column_range_is_invalid_operation() {
        let service = service();
        let err = service
            .apply_operation("big", OperationKind::Deposit, Decimal::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidOperation(_)));
        assert!(service.get_wallet("big").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deposit_past_max_balance_keeps_balance() {
        let service = service();
        service
            .apply_operation("full", OperationKind::Deposit, max_balance())
            .await
            .unwrap();
        let err = service
            .apply_operation("full", OperationKind::Deposit, dec!(0.01))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidOperation(_)));

        let wallet = service.get_wallet("full").await.unwrap().unwrap();
        assert_eq!(wallet.balance, max_balance());
    }

    #[tokio::test]
    async fn withdrawing_entire_balance_leaves_zero() {
        let service = service();
        service
            .apply_operation("w", OperationKind::Deposit, dec!(42.42))
            .await
            .unwrap();
        let wallet = service
            .apply_operation("w", OperationKind::Withdraw, dec!(42.42))
            .await
            .unwrap();
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.balance.to_string(), "0.00");
    }
}
