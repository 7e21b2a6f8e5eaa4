pub mod address;
pub mod address_encoding;
pub mod amount;
pub mod id;
pub mod metadata;

pub use address::AccountAddress;
pub use amount::{CreditAmount, CREDIT_BASE_UNIT, CREDIT_DECIMALS};
pub use id::{
    consumer_certificate_id, derive_id, governance_config_id, minter_certificate_id,
    token_definition_id, EntityId, CONSUMER_CERT_TAG, GOVERNANCE_CONFIG_TAG, MINTER_CERT_TAG,
    TOKEN_DEFINITION_TAG,
};
pub use metadata::{CertificateMetadata, RETIREMENT_CERT_NAME, RETIREMENT_CERT_SYMBOL};
