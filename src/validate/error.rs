use thiserror::Error;

use crate::grammar::InvalidFormat;

/// The validator is misconfigured. This is never an address verdict.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MX checking needs a sender address or a HELO domain (HELO guessing is disabled)")]
    MissingIdentity,
    #[error("sender address {address:?} is not valid: {source}")]
    InvalidSender {
        address: String,
        #[source]
        source: InvalidFormat,
    },
    #[error("failed to guess a HELO name from host name {hostname:?}; please provide one")]
    HeloUnresolvable {
        hostname: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ConfigError {
    pub(crate) fn invalid_sender(address: impl Into<String>, source: InvalidFormat) -> Self {
        Self::InvalidSender {
            address: address.into(),
            source,
        }
    }

    pub fn helo_unresolvable(
        hostname: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::HeloUnresolvable {
            hostname: hostname.into(),
            source: source.into(),
        }
    }
}
