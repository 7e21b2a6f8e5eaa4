use crate::balance::BalanceManager;
use crate::certificate::CertificateIssuer;
use crate::definition::DefinitionManager;
use crate::error::{LedgerError, Result};
use crate::hook::TransferHook;
use crate::storage::LedgerStorage;
use std::sync::Arc;
use tracing::info;
use verde_types::{AccountAddress, CreditAmount, EntityId};

/// Executes minting against quota. The quota decrement, the supply increase,
/// and the destination credit commit as one unit.
pub struct MintEngine {
    issuer: Arc<CertificateIssuer>,
    definitions: Arc<DefinitionManager>,
    hook: Arc<TransferHook>,
    balances: Arc<BalanceManager>,
    storage: Arc<dyn LedgerStorage>,
}

impl MintEngine {
    pub fn new(
        issuer: Arc<CertificateIssuer>,
        definitions: Arc<DefinitionManager>,
        hook: Arc<TransferHook>,
        balances: Arc<BalanceManager>,
        storage: Arc<dyn LedgerStorage>,
    ) -> Self {
        Self {
            issuer,
            definitions,
            hook,
            balances,
            storage,
        }
    }

    /// Mints `amount` of `token` to `destination` against the caller's
    /// certificate. The first successful mint binds the certificate to the
    /// definition permanently.
    pub async fn mint(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
        destination: AccountAddress,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "mint amount must be positive".to_string(),
            ));
        }

        let cert = self.issuer.minter(certificate).await?;
        if cert.holder != caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} does not hold certificate {}",
                caller, certificate
            )));
        }

        let definition = self.definitions.definition(token).await?;
        if definition.creator_minter != certificate {
            return Err(LedgerError::Unauthorized(format!(
                "token {} was not created under certificate {}",
                token, certificate
            )));
        }
        if let Some(bound) = cert.bound_token {
            if bound != token {
                return Err(LedgerError::Unauthorized(format!(
                    "certificate {} is bound to token {}",
                    certificate, bound
                )));
            }
        }

        if amount > cert.quota_remaining {
            return Err(LedgerError::QuotaExceeded {
                requested: amount,
                remaining: cert.quota_remaining,
            });
        }

        definition
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        cert.total_minted
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        // A closed definition only accepts certified receivers; minting to
        // the minter itself stays inside the capability boundary.
        if definition.closed && destination != cert.holder {
            self.hook
                .validate_mint_destination(token, &definition, destination)
                .await?;
        }

        self.storage.begin_transaction().await?;
        let applied = self
            .apply(certificate, token, amount, destination)
            .await;
        match applied {
            Ok(()) => {
                self.storage.commit_transaction().await?;
                info!(
                    certificate = %certificate,
                    token = %token,
                    destination = %destination,
                    amount = amount.to_credits(),
                    quota_remaining =
                        cert.quota_remaining.saturating_sub(amount).to_credits(),
                    "🌱 Credits minted"
                );
                Ok(())
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
        destination: AccountAddress,
    ) -> Result<()> {
        self.balances.credit(token, destination, amount).await?;
        self.issuer.apply_mint(certificate, token, amount).await?;
        self.definitions.add_supply(token, amount).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::GovernanceRegistry;
    use crate::storage::MemoryStorage;
    use verde_types::CertificateMetadata;

    struct Fixture {
        admin: AccountAddress,
        minter: AccountAddress,
        cert: EntityId,
        token: EntityId,
        issuer: Arc<CertificateIssuer>,
        definitions: Arc<DefinitionManager>,
        balances: Arc<BalanceManager>,
        engine: MintEngine,
    }

    async fn fixture(closed: bool) -> Fixture {
        let admin = AccountAddress::from_bytes([1; 32]);
        let minter = AccountAddress::from_bytes([2; 32]);

        let governance = Arc::new(GovernanceRegistry::new());
        governance.initialize(admin).await.unwrap();

        let issuer = Arc::new(CertificateIssuer::new(governance.clone()));
        let cert = issuer
            .issue_minter_certificate(admin, minter, CertificateMetadata::default())
            .await
            .unwrap();

        let storage = Arc::new(MemoryStorage::new());
        let balances = Arc::new(BalanceManager::new(storage.clone()));
        let hook = Arc::new(TransferHook::new(
            issuer.clone(),
            balances.clone(),
            storage.clone(),
        ));
        let definitions = Arc::new(DefinitionManager::new(
            governance,
            issuer.clone(),
            hook.clone(),
        ));
        let token = definitions
            .create_token_definition(admin, cert, "VCC", "Verde", "", 6, closed, None)
            .await
            .unwrap();

        let engine = MintEngine::new(
            issuer.clone(),
            definitions.clone(),
            hook,
            balances.clone(),
            storage,
        );

        Fixture {
            admin,
            minter,
            cert,
            token,
            issuer,
            definitions,
            balances,
            engine,
        }
    }

    #[tokio::test]
    async fn test_mint_decrements_quota_and_raises_supply() {
        let fx = fixture(false).await;
        fx.issuer
            .set_quota(fx.admin, fx.cert, CreditAmount::from_base_units(1000))
            .await
            .unwrap();

        fx.engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(300),
                fx.minter,
            )
            .await
            .unwrap();

        let cert = fx.issuer.minter(fx.cert).await.unwrap();
        assert_eq!(cert.quota_remaining, CreditAmount::from_base_units(700));
        assert_eq!(cert.total_minted, CreditAmount::from_base_units(300));
        assert_eq!(cert.bound_token, Some(fx.token));
        assert_eq!(
            fx.definitions.total_supply(fx.token).await.unwrap(),
            CreditAmount::from_base_units(300)
        );
        assert_eq!(
            fx.balances.get_balance(fx.token, fx.minter).await.unwrap(),
            CreditAmount::from_base_units(300)
        );
    }

    #[tokio::test]
    async fn test_quota_exceeded_leaves_state_unchanged() {
        let fx = fixture(false).await;
        fx.issuer
            .set_quota(fx.admin, fx.cert, CreditAmount::from_base_units(1000))
            .await
            .unwrap();

        fx.engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(300),
                fx.minter,
            )
            .await
            .unwrap();

        let err = fx
            .engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(800),
                fx.minter,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::QuotaExceeded { .. }));

        let cert = fx.issuer.minter(fx.cert).await.unwrap();
        assert_eq!(cert.quota_remaining, CreditAmount::from_base_units(700));
        assert_eq!(
            fx.definitions.total_supply(fx.token).await.unwrap(),
            CreditAmount::from_base_units(300)
        );
        assert_eq!(
            fx.balances.get_balance(fx.token, fx.minter).await.unwrap(),
            CreditAmount::from_base_units(300)
        );
    }

    #[tokio::test]
    async fn test_only_holder_may_mint() {
        let fx = fixture(false).await;
        fx.issuer
            .set_quota(fx.admin, fx.cert, CreditAmount::from_base_units(1000))
            .await
            .unwrap();

        let stranger = AccountAddress::from_bytes([9; 32]);
        let err = fx
            .engine
            .mint(
                stranger,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(10),
                stranger,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let fx = fixture(false).await;
        let err = fx
            .engine
            .mint(fx.minter, fx.cert, fx.token, CreditAmount::ZERO, fx.minter)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_closed_mint_requires_consumer_certificate() {
        let fx = fixture(true).await;
        fx.issuer
            .set_quota(fx.admin, fx.cert, CreditAmount::from_base_units(1000))
            .await
            .unwrap();

        let buyer = AccountAddress::from_bytes([7; 32]);
        let err = fx
            .engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(50),
                buyer,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CapabilityRequired(_)));

        // Minting to the minter itself needs no consumer certificate
        fx.engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(50),
                fx.minter,
            )
            .await
            .unwrap();

        // After issuance the identical mint succeeds
        fx.issuer
            .issue_consumer_certificate(fx.admin, buyer, CertificateMetadata::default())
            .await
            .unwrap();
        fx.engine
            .mint(
                fx.minter,
                fx.cert,
                fx.token,
                CreditAmount::from_base_units(50),
                buyer,
            )
            .await
            .unwrap();
        assert_eq!(
            fx.balances.get_balance(fx.token, buyer).await.unwrap(),
            CreditAmount::from_base_units(50)
        );
    }
}
