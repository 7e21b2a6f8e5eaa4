use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{AccountAddress, CreditAmount, EntityId};

// Balances are scoped per token definition
type BalanceMap = HashMap<(EntityId, AccountAddress), CreditAmount>;

/// Storage backend for token balances. Stands in for the ledger substrate's
/// per-account state; the transaction methods give each protocol operation
/// its all-or-nothing guarantee.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn get_balance(&self, token: EntityId, address: AccountAddress)
        -> Result<CreditAmount>;
    async fn set_balance(
        &self,
        token: EntityId,
        address: AccountAddress,
        balance: CreditAmount,
    ) -> Result<()>;
    async fn get_token_holders(&self, token: EntityId) -> Result<Vec<AccountAddress>>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;
}

pub struct MemoryStorage {
    balances: Arc<RwLock<BalanceMap>>,
    transaction_backup: Arc<RwLock<Option<BalanceMap>>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            transaction_backup: Arc::new(RwLock::new(None)),
        }
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn get_balance(
        &self,
        token: EntityId,
        address: AccountAddress,
    ) -> Result<CreditAmount> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(&(token, address))
            .copied()
            .unwrap_or(CreditAmount::ZERO))
    }

    async fn set_balance(
        &self,
        token: EntityId,
        address: AccountAddress,
        balance: CreditAmount,
    ) -> Result<()> {
        let mut balances = self.balances.write().await;

        if balance == CreditAmount::ZERO {
            balances.remove(&(token, address));
        } else {
            balances.insert((token, address), balance);
        }

        Ok(())
    }

    async fn get_token_holders(&self, token: EntityId) -> Result<Vec<AccountAddress>> {
        let balances = self.balances.read().await;
        Ok(balances
            .keys()
            .filter(|(t, _)| *t == token)
            .map(|(_, addr)| *addr)
            .collect())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let balances = self.balances.read().await;

        let mut backup = self.transaction_backup.write().await;
        *backup = Some(balances.clone());

        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;
        *backup = None;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;

        if let Some(balance_backup) = backup.take() {
            let mut balances = self.balances.write().await;
            let accounts_before = balances.len();
            *balances = balance_backup;

            info!(
                accounts_before = accounts_before,
                accounts_after = balances.len(),
                storage_type = "memory",
                "❌ Transaction rolled back (snapshot restored)"
            );
        }

        Ok(())
    }
}
