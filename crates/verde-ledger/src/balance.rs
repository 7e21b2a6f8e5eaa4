use crate::error::{LedgerError, Result};
use crate::storage::LedgerStorage;
use std::sync::Arc;
use tracing::info;
use verde_types::{AccountAddress, CreditAmount, EntityId};

/// Token-scoped balance accounting over the storage backend.
pub struct BalanceManager {
    storage: Arc<dyn LedgerStorage>,
}

impl BalanceManager {
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self { storage }
    }

    pub async fn get_balance(
        &self,
        token: EntityId,
        address: AccountAddress,
    ) -> Result<CreditAmount> {
        self.storage.get_balance(token, address).await
    }

    pub async fn credit(
        &self,
        token: EntityId,
        address: AccountAddress,
        amount: CreditAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let current = self.storage.get_balance(token, address).await?;
        let new_balance = current.checked_add(amount).ok_or(LedgerError::Overflow)?;

        self.storage.set_balance(token, address, new_balance).await?;

        info!(
            token = %token,
            address = %address,
            amount = amount.to_credits(),
            balance_before = current.to_credits(),
            balance_after = new_balance.to_credits(),
            "💰 Balance credited"
        );
        Ok(())
    }

    pub async fn debit(
        &self,
        token: EntityId,
        address: AccountAddress,
        amount: CreditAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let current = self.storage.get_balance(token, address).await?;
        let new_balance = current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                has: current,
                needs: amount,
            })?;

        self.storage.set_balance(token, address, new_balance).await?;

        info!(
            token = %token,
            address = %address,
            amount = amount.to_credits(),
            balance_before = current.to_credits(),
            balance_after = new_balance.to_credits(),
            "💸 Balance debited"
        );
        Ok(())
    }

    /// Sum of all balances held in a token. Used by conservation checks.
    pub async fn total_held(&self, token: EntityId) -> Result<CreditAmount> {
        let holders = self.storage.get_token_holders(token).await?;
        let mut sum = CreditAmount::ZERO;
        for holder in holders {
            let balance = self.storage.get_balance(token, holder).await?;
            sum = sum.checked_add(balance).ok_or(LedgerError::Overflow)?;
        }
        Ok(sum)
    }
}
