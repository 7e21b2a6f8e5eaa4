use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{governance_config_id, AccountAddress, EntityId};

/// Singleton authority state. Lifecycle is one-way: the registry starts
/// uninitialized and `initialize` transitions it exactly once; there is no
/// authority-transfer or teardown path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub admin: AccountAddress,
    pub initialized: bool,
    pub initialized_at: i64,
}

pub struct GovernanceRegistry {
    config: Arc<RwLock<Option<GovernanceConfig>>>,
}

impl Default for GovernanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceRegistry {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Establishes the single admin identity used by every subsequent
    /// authorization check. Rejects a second call for the lifetime of the
    /// deployment.
    pub async fn initialize(&self, admin: AccountAddress) -> Result<EntityId> {
        let mut config = self.config.write().await;

        if config.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        *config = Some(GovernanceConfig {
            admin,
            initialized: true,
            initialized_at: chrono::Utc::now().timestamp(),
        });

        info!(admin = %admin, "🏛️ Governance config initialized");
        Ok(governance_config_id())
    }

    pub async fn is_initialized(&self) -> bool {
        self.config.read().await.is_some()
    }

    pub async fn config(&self) -> Option<GovernanceConfig> {
        self.config.read().await.clone()
    }

    pub async fn admin(&self) -> Result<AccountAddress> {
        let config = self.config.read().await;
        config
            .as_ref()
            .map(|c| c.admin)
            .ok_or_else(|| LedgerError::NotFound(governance_config_id()))
    }

    /// Gate for admin-only operations.
    pub async fn require_admin(&self, caller: AccountAddress) -> Result<()> {
        let admin = self.admin().await?;
        if caller != admin {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} is not the governance admin",
                caller
            )));
        }
        Ok(())
    }
}
