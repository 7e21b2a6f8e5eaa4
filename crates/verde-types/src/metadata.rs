use serde::{Deserialize, Serialize};

/// Display metadata stamped on issued certificates. The ledger never
/// interprets it; it travels with the certificate for off-chain tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl CertificateMetadata {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
        }
    }
}

/// Fixed identity stamped on every retirement certificate.
pub const RETIREMENT_CERT_NAME: &str = "Retired Carbon Credits";
pub const RETIREMENT_CERT_SYMBOL: &str = "RCC";
