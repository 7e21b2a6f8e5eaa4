pub mod balance;
pub mod certificate;
pub mod definition;
pub mod error;
pub mod governance;
pub mod hook;
pub mod mint;
pub mod retire;
pub mod storage;

pub use balance::BalanceManager;
pub use certificate::{
    Certificate, CertificateIssuer, ConsumerCertificate, MinterCertificate, RetirementCertificate,
};
pub use definition::{DefinitionManager, FeeConfig, TokenDefinition, MAX_BASIS_POINTS};
pub use error::{LedgerError, Result};
pub use governance::{GovernanceConfig, GovernanceRegistry};
pub use hook::{compute_fee, HookRegistration, TransferHook, TransferOutcome};
pub use mint::MintEngine;
pub use retire::RetirementEngine;
pub use storage::{LedgerStorage, MemoryStorage};

use std::sync::Arc;
use tracing::info;
use verde_types::{AccountAddress, CertificateMetadata, CreditAmount, EntityId};

/// The assembled ledger core: governance registry, capability issuer,
/// definition manager, mint enforcement, transfer hook, and retirement
/// engine over one storage backend. Each public method is one atomic
/// protocol operation; it either commits entirely or is a logical no-op.
pub struct VerdeLedger {
    pub storage: Arc<dyn LedgerStorage>,
    pub balances: Arc<BalanceManager>,
    pub governance: Arc<GovernanceRegistry>,
    pub certificates: Arc<CertificateIssuer>,
    pub definitions: Arc<DefinitionManager>,
    pub hook: Arc<TransferHook>,
    pub minting: Arc<MintEngine>,
    pub retirement: Arc<RetirementEngine>,
}

impl VerdeLedger {
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        let balances = Arc::new(BalanceManager::new(storage.clone()));
        let governance = Arc::new(GovernanceRegistry::new());
        let certificates = Arc::new(CertificateIssuer::new(governance.clone()));
        let hook = Arc::new(TransferHook::new(
            certificates.clone(),
            balances.clone(),
            storage.clone(),
        ));
        let definitions = Arc::new(DefinitionManager::new(
            governance.clone(),
            certificates.clone(),
            hook.clone(),
        ));
        let minting = Arc::new(MintEngine::new(
            certificates.clone(),
            definitions.clone(),
            hook.clone(),
            balances.clone(),
            storage.clone(),
        ));
        let retirement = Arc::new(RetirementEngine::new(
            certificates.clone(),
            definitions.clone(),
            balances.clone(),
            storage.clone(),
        ));

        Self {
            storage,
            balances,
            governance,
            certificates,
            definitions,
            hook,
            minting,
            retirement,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub async fn initialize(&self, admin: AccountAddress) -> Result<EntityId> {
        self.governance.initialize(admin).await
    }

    pub async fn issue_minter_certificate(
        &self,
        caller: AccountAddress,
        holder: AccountAddress,
        metadata: CertificateMetadata,
    ) -> Result<EntityId> {
        self.certificates
            .issue_minter_certificate(caller, holder, metadata)
            .await
    }

    pub async fn issue_consumer_certificate(
        &self,
        caller: AccountAddress,
        holder: AccountAddress,
        metadata: CertificateMetadata,
    ) -> Result<EntityId> {
        self.certificates
            .issue_consumer_certificate(caller, holder, metadata)
            .await
    }

    pub async fn set_quota(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        new_quota: CreditAmount,
    ) -> Result<()> {
        self.certificates
            .set_quota(caller, certificate, new_quota)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_token_definition(
        &self,
        caller: AccountAddress,
        creator_minter: EntityId,
        symbol: &str,
        name: &str,
        uri: &str,
        decimals: u8,
        closed: bool,
        fee_config: Option<FeeConfig>,
    ) -> Result<EntityId> {
        self.definitions
            .create_token_definition(
                caller,
                creator_minter,
                symbol,
                name,
                uri,
                decimals,
                closed,
                fee_config,
            )
            .await
    }

    pub async fn mint(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
        destination: AccountAddress,
    ) -> Result<()> {
        self.minting
            .mint(caller, certificate, token, amount, destination)
            .await
    }

    /// Moves `amount` of `token` from `from` to `to`. Closed definitions
    /// route through the transfer hook; open definitions move directly.
    pub async fn transfer(
        &self,
        from: AccountAddress,
        to: AccountAddress,
        token: EntityId,
        amount: CreditAmount,
    ) -> Result<TransferOutcome> {
        let definition = self.definitions.definition(token).await?;

        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from == to {
            return Err(LedgerError::InvalidAmount(
                "cannot transfer to same address".to_string(),
            ));
        }

        if definition.closed {
            return self
                .hook
                .execute_transfer(token, &definition, from, to, amount)
                .await;
        }

        let balance = self.balances.get_balance(token, from).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                has: balance,
                needs: amount,
            });
        }

        self.storage.begin_transaction().await?;
        let moved = async {
            self.balances.debit(token, from, amount).await?;
            self.balances.credit(token, to, amount).await
        }
        .await;
        match moved {
            Ok(()) => {
                self.storage.commit_transaction().await?;
                info!(
                    token = %token,
                    from = %from,
                    to = %to,
                    amount = amount.to_credits(),
                    "✅ Open transfer committed"
                );
                Ok(TransferOutcome {
                    amount,
                    fee: CreditAmount::ZERO,
                    net_amount: amount,
                })
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    pub async fn retire(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
    ) -> Result<EntityId> {
        self.retirement
            .retire(caller, certificate, token, amount)
            .await
    }

    pub async fn balance_of(
        &self,
        token: EntityId,
        address: AccountAddress,
    ) -> Result<CreditAmount> {
        self.balances.get_balance(token, address).await
    }

    pub async fn total_supply(&self, token: EntityId) -> Result<CreditAmount> {
        self.definitions.total_supply(token).await
    }

    pub async fn collected_fees(&self, token: EntityId) -> Result<CreditAmount> {
        self.balances
            .get_balance(token, AccountAddress::fee_collector())
            .await
    }
}
