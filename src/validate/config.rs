use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::smtp::DEFAULT_PORT;

/// Validation policy. Build it once, hand it to a
/// [`Validator`](crate::Validator) or install it with [`set_default_config`].
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Require MX or A records for the domain.
    pub check_dns: bool,
    /// Probe the mail exchangers over SMTP. Implies the DNS check.
    pub check_mx: bool,
    /// Envelope sender for probes; also the HELO fallback (its domain).
    /// `None` sends the null sender.
    pub sender_address: Option<String>,
    /// Explicit HELO identity.
    pub helo_domain: Option<String>,
    /// Per-candidate budget for a whole SMTP session.
    pub timeout: Duration,
    pub port: u16,
    /// Fall back to this machine's host name when no HELO identity is configured.
    pub guess_helo: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_dns: false,
            check_mx: false,
            sender_address: None,
            helo_domain: None,
            timeout: Duration::from_secs(5),
            port: DEFAULT_PORT,
            guess_helo: true,
        }
    }
}

impl ValidatorConfig {
    pub fn check_dns(mut self, enabled: bool) -> Self {
        self.check_dns = enabled;
        self
    }

    pub fn check_mx(mut self, enabled: bool) -> Self {
        self.check_mx = enabled;
        self
    }

    pub fn sender_address(mut self, sender: impl Into<String>) -> Self {
        self.sender_address = Some(sender.into());
        self
    }

    pub fn helo_domain(mut self, helo: impl Into<String>) -> Self {
        self.helo_domain = Some(helo.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn guess_helo(mut self, enabled: bool) -> Self {
        self.guess_helo = enabled;
        self
    }

    pub fn dns_stage_enabled(&self) -> bool {
        self.check_dns || self.check_mx
    }

    /// Configured sender, ignoring blank values.
    pub(crate) fn sender(&self) -> Option<&str> {
        self.sender_address
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn explicit_helo(&self) -> Option<&str> {
        self.helo_domain
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

static DEFAULT_CONFIG: RwLock<Option<ValidatorConfig>> = RwLock::new(None);

/// Replaces the process-wide configuration used by [`validate`](crate::validate).
pub fn set_default_config(config: ValidatorConfig) {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(config);
}

/// Snapshot of the process-wide configuration.
pub fn default_config() -> ValidatorConfig {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default()
}
