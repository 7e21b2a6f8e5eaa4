use crate::error::{LedgerError, Result};
use crate::governance::GovernanceRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use verde_types::{
    consumer_certificate_id, minter_certificate_id, AccountAddress, CertificateMetadata,
    CreditAmount, EntityId,
};

/// Capability credential authorizing its holder to mint one bound token
/// definition, subject to an admin-set quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinterCertificate {
    pub holder: AccountAddress,
    pub quota_remaining: CreditAmount,
    pub total_minted: CreditAmount,
    pub bound_token: Option<EntityId>,
    pub metadata: CertificateMetadata,
}

/// Capability credential authorizing its holder to receive, hold, and retire
/// a closed token definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerCertificate {
    pub holder: AccountAddress,
    pub active: bool,
    pub metadata: CertificateMetadata,
}

/// Permanent, non-transferable proof of retirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementCertificate {
    pub serial: EntityId,
    pub consumer: AccountAddress,
    pub source_token: EntityId,
    pub amount_retired: CreditAmount,
    pub retired_at: i64,
    pub metadata: CertificateMetadata,
}

/// Certificates double as access-control credentials and ledger assets, so
/// they share one keyed arena; authorization checks pattern-match on the
/// variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Certificate {
    Minter(MinterCertificate),
    Consumer(ConsumerCertificate),
    Retirement(RetirementCertificate),
}

impl Certificate {
    pub fn holder(&self) -> AccountAddress {
        match self {
            Certificate::Minter(cert) => cert.holder,
            Certificate::Consumer(cert) => cert.holder,
            Certificate::Retirement(cert) => cert.consumer,
        }
    }
}

/// Issues and tracks capability certificates; owns quota accounting.
pub struct CertificateIssuer {
    governance: Arc<GovernanceRegistry>,
    certificates: Arc<RwLock<HashMap<EntityId, Certificate>>>,
}

impl CertificateIssuer {
    pub fn new(governance: Arc<GovernanceRegistry>) -> Self {
        Self {
            governance,
            certificates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Admin-only. The new certificate starts with no quota; minting
    /// capability is inert until `set_quota` grants one.
    pub async fn issue_minter_certificate(
        &self,
        caller: AccountAddress,
        holder: AccountAddress,
        metadata: CertificateMetadata,
    ) -> Result<EntityId> {
        self.governance.require_admin(caller).await?;

        let cert_id = minter_certificate_id(&holder);
        let mut certificates = self.certificates.write().await;

        if certificates.contains_key(&cert_id) {
            return Err(LedgerError::AlreadyExists(cert_id));
        }

        certificates.insert(
            cert_id,
            Certificate::Minter(MinterCertificate {
                holder,
                quota_remaining: CreditAmount::ZERO,
                total_minted: CreditAmount::ZERO,
                bound_token: None,
                metadata,
            }),
        );

        info!(
            certificate = %cert_id,
            holder = %holder,
            "📜 Minter certificate issued"
        );
        Ok(cert_id)
    }

    /// Admin-only. The new certificate is active immediately.
    pub async fn issue_consumer_certificate(
        &self,
        caller: AccountAddress,
        holder: AccountAddress,
        metadata: CertificateMetadata,
    ) -> Result<EntityId> {
        self.governance.require_admin(caller).await?;

        let cert_id = consumer_certificate_id(&holder);
        let mut certificates = self.certificates.write().await;

        if certificates.contains_key(&cert_id) {
            return Err(LedgerError::AlreadyExists(cert_id));
        }

        certificates.insert(
            cert_id,
            Certificate::Consumer(ConsumerCertificate {
                holder,
                active: true,
                metadata,
            }),
        );

        info!(
            certificate = %cert_id,
            holder = %holder,
            "📜 Consumer certificate issued"
        );
        Ok(cert_id)
    }

    /// Admin-only absolute assignment. This SETS the remaining quota — it can
    /// lower it below what was previously granted as well as raise it. A
    /// top-up semantics was considered and rejected; see DESIGN.md.
    pub async fn set_quota(
        &self,
        caller: AccountAddress,
        certificate: EntityId,
        new_quota: CreditAmount,
    ) -> Result<()> {
        self.governance.require_admin(caller).await?;

        let mut certificates = self.certificates.write().await;
        let cert = certificates
            .get_mut(&certificate)
            .ok_or(LedgerError::NotFound(certificate))?;

        match cert {
            Certificate::Minter(minter) => {
                let old_quota = minter.quota_remaining;
                minter.quota_remaining = new_quota;

                info!(
                    certificate = %certificate,
                    holder = %minter.holder,
                    quota_before = old_quota.to_credits(),
                    quota_after = new_quota.to_credits(),
                    "🎯 Mint quota set"
                );
                Ok(())
            }
            _ => Err(LedgerError::NotFound(certificate)),
        }
    }

    pub async fn certificate(&self, id: EntityId) -> Option<Certificate> {
        self.certificates.read().await.get(&id).cloned()
    }

    pub async fn minter(&self, id: EntityId) -> Result<MinterCertificate> {
        match self.certificates.read().await.get(&id) {
            Some(Certificate::Minter(cert)) => Ok(cert.clone()),
            _ => Err(LedgerError::NotFound(id)),
        }
    }

    pub async fn consumer(&self, id: EntityId) -> Result<ConsumerCertificate> {
        match self.certificates.read().await.get(&id) {
            Some(Certificate::Consumer(cert)) => Ok(cert.clone()),
            _ => Err(LedgerError::NotFound(id)),
        }
    }

    /// Whether `holder` carries an active consumer certificate. This is the
    /// capability the transfer hook checks on both parties.
    pub async fn is_active_consumer(&self, holder: AccountAddress) -> bool {
        let cert_id = consumer_certificate_id(&holder);
        matches!(
            self.certificates.read().await.get(&cert_id),
            Some(Certificate::Consumer(cert)) if cert.active
        )
    }

    /// Applies a successful mint to the certificate: decrements quota,
    /// increments the lifetime total, and binds the token on first use.
    /// The caller has already validated quota and binding; the substrate's
    /// serialization of conflicting operations keeps that validation current.
    pub(crate) async fn apply_mint(
        &self,
        certificate: EntityId,
        token: EntityId,
        amount: CreditAmount,
    ) -> Result<()> {
        let mut certificates = self.certificates.write().await;
        let cert = certificates
            .get_mut(&certificate)
            .ok_or(LedgerError::NotFound(certificate))?;

        match cert {
            Certificate::Minter(minter) => {
                minter.quota_remaining = minter
                    .quota_remaining
                    .checked_sub(amount)
                    .ok_or(LedgerError::QuotaExceeded {
                        requested: amount,
                        remaining: minter.quota_remaining,
                    })?;
                minter.total_minted = minter
                    .total_minted
                    .checked_add(amount)
                    .ok_or(LedgerError::Overflow)?;
                if minter.bound_token.is_none() {
                    minter.bound_token = Some(token);
                    info!(
                        certificate = %certificate,
                        token = %token,
                        "🔗 Minter certificate bound to token definition"
                    );
                }
                Ok(())
            }
            _ => Err(LedgerError::NotFound(certificate)),
        }
    }

    /// Registers a retirement certificate in the arena. Serials are fresh by
    /// construction, so a collision is a storage fault.
    pub(crate) async fn record_retirement(&self, cert: RetirementCertificate) -> Result<()> {
        let mut certificates = self.certificates.write().await;
        if certificates.contains_key(&cert.serial) {
            return Err(LedgerError::AlreadyExists(cert.serial));
        }
        certificates.insert(cert.serial, Certificate::Retirement(cert));
        Ok(())
    }
}
