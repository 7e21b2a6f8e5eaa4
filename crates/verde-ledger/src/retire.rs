use crate::balance::BalanceManager;
use crate::certificate::{CertificateIssuer, RetirementCertificate};
use crate::definition::DefinitionManager;
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStorage;
use blake3::Hasher;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{
    AccountAddress, CertificateMetadata, CreditAmount, EntityId, RETIREMENT_CERT_NAME,
    RETIREMENT_CERT_SYMBOL,
};

/// Burns consumer-held credits and issues the permanent proof certificate.
pub struct RetirementEngine {
    issuer: Arc<CertificateIssuer>,
    definitions: Arc<DefinitionManager>,
    balances: Arc<BalanceManager>,
    storage: Arc<dyn LedgerStorage>,
    serials: Arc<RwLock<Vec<EntityId>>>,
    sequence: Arc<RwLock<u64>>,
}

impl RetirementEngine {
    pub fn new(
        issuer: Arc<CertificateIssuer>,
        definitions: Arc<DefinitionManager>,
        balances: Arc<BalanceManager>,
        storage: Arc<dyn LedgerStorage>,
    ) -> Self {
        Self {
            issuer,
            definitions,
            balances,
            storage,
            serials: Arc::new(RwLock::new(Vec::new())),
            sequence: Arc::new(RwLock::new(0)),
        }
    }

    /// Burns `amount` of `token` from the caller's balance and mints a fresh
    /// retirement certificate recording it. The burn, the supply decrement,
    /// and the certificate creation commit as one unit.
    pub async fn retire(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
    ) -> Result<EntityId> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "retirement amount must be positive".to_string(),
            ));
        }

        let cert = self.issuer.consumer(certificate).await?;
        if cert.holder != caller {
            return Err(LedgerError::Unauthorized(format!(
                "caller {} does not hold certificate {}",
                caller, certificate
            )));
        }
        if !cert.active {
            return Err(LedgerError::CapabilityRequired(format!(
                "consumer certificate {} is not active",
                certificate
            )));
        }

        let definition = self.definitions.definition(token).await?;
        let balance = self.balances.get_balance(token, caller).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                has: balance,
                needs: amount,
            });
        }
        definition
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        let serial = self.next_serial(caller, token, amount).await;
        let retirement = RetirementCertificate {
            serial,
            consumer: caller,
            source_token: token,
            amount_retired: amount,
            retired_at: chrono::Utc::now().timestamp(),
            metadata: CertificateMetadata::new(
                RETIREMENT_CERT_NAME,
                RETIREMENT_CERT_SYMBOL,
                "",
            ),
        };

        self.storage.begin_transaction().await?;
        let applied = self.apply(token, caller, amount, retirement).await;
        match applied {
            Ok(()) => {
                self.storage.commit_transaction().await?;
                info!(
                    serial = %serial,
                    consumer = %caller,
                    token = %token,
                    amount = amount.to_credits(),
                    "🔥 Credits retired"
                );
                Ok(serial)
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        token: EntityId,
        consumer: AccountAddress,
        amount: CreditAmount,
        retirement: RetirementCertificate,
    ) -> Result<()> {
        let serial = retirement.serial;
        self.balances.debit(token, consumer, amount).await?;
        self.definitions.sub_supply(token, amount).await?;
        self.issuer.record_retirement(retirement).await?;

        let mut serials = self.serials.write().await;
        serials.push(serial);
        Ok(())
    }

    /// Serial derivation: content hash over the retirement plus a strictly
    /// increasing sequence number, so identical retirements still get
    /// distinct serials.
    async fn next_serial(
        &self,
        consumer: AccountAddress,
        token: EntityId,
        amount: CreditAmount,
    ) -> EntityId {
        let mut sequence = self.sequence.write().await;
        *sequence += 1;

        let mut hasher = Hasher::new();
        hasher.update(b"retirement");
        hasher.update(consumer.as_bytes());
        hasher.update(token.as_bytes());
        hasher.update(&amount.to_base_units().to_le_bytes());
        hasher.update(&sequence.to_le_bytes());
        EntityId::from_bytes(*hasher.finalize().as_bytes())
    }

    pub async fn retirement(&self, serial: EntityId) -> Result<RetirementCertificate> {
        match self.issuer.certificate(serial).await {
            Some(crate::certificate::Certificate::Retirement(cert)) => Ok(cert),
            _ => Err(LedgerError::NotFound(serial)),
        }
    }

    /// All retirements recorded by a consumer, oldest first.
    pub async fn retirements_for(&self, consumer: AccountAddress) -> Vec<RetirementCertificate> {
        let serials = self.serials.read().await;
        let mut result = Vec::new();
        for serial in serials.iter() {
            if let Some(crate::certificate::Certificate::Retirement(cert)) =
                self.issuer.certificate(*serial).await
            {
                if cert.consumer == consumer {
                    result.push(cert);
                }
            }
        }
        result
    }

    pub async fn retirement_count(&self) -> usize {
        self.serials.read().await.len()
    }
}
