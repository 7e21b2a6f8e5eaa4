use crate::certificate::CertificateIssuer;
use crate::error::{LedgerError, Result};
use crate::governance::GovernanceRegistry;
use crate::hook::TransferHook;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{token_definition_id, AccountAddress, CreditAmount, EntityId};

/// Maximum basis points (100%)
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Transfer fee configuration, fixed at definition creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub basis_points: u16,
    pub max_fee_units: CreditAmount,
}

/// A permissioned token class. `closed` definitions route every transfer
/// through the hook; `fee_config` only attaches to closed definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDefinition {
    pub symbol: String,
    pub name: String,
    pub uri: String,
    pub decimals: u8,
    pub creator_minter: EntityId,
    pub closed: bool,
    pub fee_config: Option<FeeConfig>,
    pub total_supply: CreditAmount,
}

/// Creates and tracks token definitions, keyed by the symbol-derived id.
pub struct DefinitionManager {
    governance: Arc<GovernanceRegistry>,
    issuer: Arc<CertificateIssuer>,
    hook: Arc<TransferHook>,
    definitions: Arc<RwLock<HashMap<EntityId, TokenDefinition>>>,
}

impl DefinitionManager {
    pub fn new(
        governance: Arc<GovernanceRegistry>,
        issuer: Arc<CertificateIssuer>,
        hook: Arc<TransferHook>,
    ) -> Self {
        Self {
            governance,
            issuer,
            hook,
            definitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Admin-only. `closed` and `fee_config` are fixed here for the lifetime
    /// of the definition; a closed definition gets its hook wiring
    /// materialized before it is visible.
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
        self.governance.require_admin(caller).await?;
        validate_fee_config(closed, fee_config.as_ref())?;

        // The creator must already hold a minter certificate
        self.issuer.minter(creator_minter).await?;

        let token = token_definition_id(symbol);
        let mut definitions = self.definitions.write().await;

        if definitions.contains_key(&token) {
            return Err(LedgerError::SymbolInUse(symbol.to_string()));
        }

        if closed {
            self.hook.install(token).await?;
        }

        definitions.insert(
            token,
            TokenDefinition {
                symbol: symbol.to_string(),
                name: name.to_string(),
                uri: uri.to_string(),
                decimals,
                creator_minter,
                closed,
                fee_config,
                total_supply: CreditAmount::ZERO,
            },
        );

        info!(
            token = %token,
            symbol = symbol,
            closed = closed,
            has_fee = fee_config.is_some(),
            "🪙 Token definition created"
        );
        Ok(token)
    }

    pub async fn definition(&self, token: EntityId) -> Result<TokenDefinition> {
        self.definitions
            .read()
            .await
            .get(&token)
            .cloned()
            .ok_or(LedgerError::NotFound(token))
    }

    pub async fn total_supply(&self, token: EntityId) -> Result<CreditAmount> {
        Ok(self.definition(token).await?.total_supply)
    }

    pub(crate) async fn add_supply(&self, token: EntityId, amount: CreditAmount) -> Result<()> {
        let mut definitions = self.definitions.write().await;
        let def = definitions
            .get_mut(&token)
            .ok_or(LedgerError::NotFound(token))?;
        def.total_supply = def
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub(crate) async fn sub_supply(&self, token: EntityId, amount: CreditAmount) -> Result<()> {
        let mut definitions = self.definitions.write().await;
        let def = definitions
            .get_mut(&token)
            .ok_or(LedgerError::NotFound(token))?;
        def.total_supply = def
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

fn validate_fee_config(closed: bool, fee_config: Option<&FeeConfig>) -> Result<()> {
    let Some(config) = fee_config else {
        return Ok(());
    };

    if config.basis_points > MAX_BASIS_POINTS {
        return Err(LedgerError::InvalidFeeConfig(format!(
            "basis points {} exceed maximum {}",
            config.basis_points, MAX_BASIS_POINTS
        )));
    }

    // Fee collection rides on hook enforcement, which only attaches to
    // closed definitions. Unconditional hook routing for open definitions
    // is a possible extension, not implemented here.
    if !closed {
        return Err(LedgerError::InvalidFeeConfig(
            "fee config requires a closed definition".to_string(),
        ));
    }

    Ok(())
}
