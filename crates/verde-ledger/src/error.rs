use thiserror::Error;
use verde_types::{CreditAmount, EntityId};

/// Ledger operation result type
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger errors. Every error aborts the whole operation with no partial
/// state change; callers decide retry policy.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Caller is not authorized: {0}")]
    Unauthorized(String),

    #[error("Governance config is already initialized")]
    AlreadyInitialized,

    #[error("Entity already exists: {0}")]
    AlreadyExists(EntityId),

    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    #[error("Token symbol already in use: {0}")]
    SymbolInUse(String),

    #[error("Mint quota exceeded: requested {requested}, remaining {remaining}")]
    QuotaExceeded {
        requested: CreditAmount,
        remaining: CreditAmount,
    },

    #[error("Capability required: {0}")]
    CapabilityRequired(String),

    #[error("Insufficient balance: has {has}, needs {needs}")]
    InsufficientBalance {
        has: CreditAmount,
        needs: CreditAmount,
    },

    #[error("Invalid fee config: {0}")]
    InvalidFeeConfig(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transfer hook not configured for token {0}")]
    HookNotConfigured(EntityId),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(String),
}
