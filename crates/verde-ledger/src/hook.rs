use crate::balance::BalanceManager;
use crate::certificate::CertificateIssuer;
use crate::definition::{FeeConfig, TokenDefinition, MAX_BASIS_POINTS};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStorage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{AccountAddress, CreditAmount, EntityId};

/// Enforcement wiring a closed token definition carries from creation: which
/// accounts the hook touches at transfer time. A closed definition without a
/// registration is misconfigured and must not move value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRegistration {
    pub token: EntityId,
    pub fee_collector: AccountAddress,
    pub installed_at: i64,
}

/// Outcome of a hook-mediated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub amount: CreditAmount,
    pub fee: CreditAmount,
    pub net_amount: CreditAmount,
}

/// Computes the withheld fee: basis points of the amount, truncating, capped
/// at the configured maximum.
pub fn compute_fee(fee_config: Option<&FeeConfig>, amount: CreditAmount) -> CreditAmount {
    match fee_config {
        Some(config) => {
            let bps_fee = (amount.to_base_units() as u128 * config.basis_points as u128
                / MAX_BASIS_POINTS as u128) as u64;
            CreditAmount::from_base_units(bps_fee.min(config.max_fee_units.to_base_units()))
        }
        None => CreditAmount::ZERO,
    }
}

/// Callback invoked on every value movement of a closed token definition.
/// Validates capability possession on both parties and withholds the bounded
/// fee; commits atomically with the balance movement or not at all.
pub struct TransferHook {
    issuer: Arc<CertificateIssuer>,
    balances: Arc<BalanceManager>,
    storage: Arc<dyn LedgerStorage>,
    registrations: Arc<RwLock<HashMap<EntityId, HookRegistration>>>,
}

impl TransferHook {
    pub fn new(
        issuer: Arc<CertificateIssuer>,
        balances: Arc<BalanceManager>,
        storage: Arc<dyn LedgerStorage>,
    ) -> Self {
        Self {
            issuer,
            balances,
            storage,
            registrations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Materializes the enforcement wiring for a closed definition. Called by
    /// the definition manager at creation time.
    pub(crate) async fn install(&self, token: EntityId) -> Result<()> {
        let mut registrations = self.registrations.write().await;
        if registrations.contains_key(&token) {
            return Err(LedgerError::AlreadyExists(token));
        }

        registrations.insert(
            token,
            HookRegistration {
                token,
                fee_collector: AccountAddress::fee_collector(),
                installed_at: chrono::Utc::now().timestamp(),
            },
        );

        info!(token = %token, "🪝 Transfer hook installed");
        Ok(())
    }

    pub async fn is_installed(&self, token: EntityId) -> bool {
        self.registrations.read().await.contains_key(&token)
    }

    pub async fn registration(&self, token: EntityId) -> Option<HookRegistration> {
        self.registrations.read().await.get(&token).cloned()
    }

    /// A party may move a closed token iff it is the bound minter or carries
    /// an active consumer certificate.
    async fn is_permitted_party(
        &self,
        definition: &TokenDefinition,
        party: AccountAddress,
    ) -> Result<bool> {
        let minter = self.issuer.minter(definition.creator_minter).await?;
        if party == minter.holder {
            return Ok(true);
        }
        Ok(self.issuer.is_active_consumer(party).await)
    }

    /// Capability validation for a mint into a closed definition, treated as
    /// a transfer from a null source: only the destination is checked, and no
    /// fee applies.
    pub(crate) async fn validate_mint_destination(
        &self,
        token: EntityId,
        definition: &TokenDefinition,
        destination: AccountAddress,
    ) -> Result<()> {
        if !self.is_installed(token).await {
            return Err(LedgerError::HookNotConfigured(token));
        }
        if !self.is_permitted_party(definition, destination).await? {
            return Err(LedgerError::CapabilityRequired(format!(
                "destination {} holds no active consumer certificate",
                destination
            )));
        }
        Ok(())
    }

    /// Executes a transfer of a closed definition: capability checks, fee
    /// withholding, and the balance movement, all in one storage transaction.
    pub(crate) async fn execute_transfer(
        &self,
        token: EntityId,
        definition: &TokenDefinition,
        from: AccountAddress,
        to: AccountAddress,
        amount: CreditAmount,
    ) -> Result<TransferOutcome> {
        let registration = self
            .registration(token)
            .await
            .ok_or(LedgerError::HookNotConfigured(token))?;

        if !self.is_permitted_party(definition, from).await? {
            return Err(LedgerError::CapabilityRequired(format!(
                "sender {} holds no active consumer certificate",
                from
            )));
        }
        if !self.is_permitted_party(definition, to).await? {
            return Err(LedgerError::CapabilityRequired(format!(
                "receiver {} holds no active consumer certificate",
                to
            )));
        }

        let fee = compute_fee(definition.fee_config.as_ref(), amount);
        // The basis-point share can never exceed the amount, but the max-fee
        // cap is configured independently and must be checked.
        let net_amount = amount
            .checked_sub(fee)
            .ok_or_else(|| LedgerError::InvalidAmount(format!(
                "fee {} exceeds transfer amount {}",
                fee, amount
            )))?;

        let balance = self.balances.get_balance(token, from).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                has: balance,
                needs: amount,
            });
        }

        self.storage.begin_transaction().await?;
        let moved = self
            .move_balances(token, from, to, registration.fee_collector, amount, fee, net_amount)
            .await;
        match moved {
            Ok(()) => {
                self.storage.commit_transaction().await?;
                info!(
                    token = %token,
                    from = %from,
                    to = %to,
                    amount = amount.to_credits(),
                    fee = fee.to_credits(),
                    net_amount = net_amount.to_credits(),
                    "✅ Closed transfer committed"
                );
                Ok(TransferOutcome {
                    amount,
                    fee,
                    net_amount,
                })
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn move_balances(
        &self,
        token: EntityId,
        from: AccountAddress,
        to: AccountAddress,
        fee_collector: AccountAddress,
        amount: CreditAmount,
        fee: CreditAmount,
        net_amount: CreditAmount,
    ) -> Result<()> {
        self.balances.debit(token, from, amount).await?;
        self.balances.credit(token, to, net_amount).await?;
        if !fee.is_zero() {
            self.balances.credit(token, fee_collector, fee).await?;
        }
        Ok(())
    }
}
