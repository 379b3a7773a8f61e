use trust_dns_resolver::proto::rr::RecordType;

use crate::dns::SystemResolver;
use crate::grammar;

use super::{ConfigError, ValidatorConfig};

/// Source of this machine's fully-qualified name, used as the last-resort
/// HELO identity.
pub trait LocalHostname: Send + Sync {
    fn fqdn(&self) -> Result<String, ConfigError>;
}

/// Resolves `gethostname()` through the system resolver and returns the
/// name the address records were published under.
#[derive(Debug, Default)]
pub struct SystemHostname {
    resolver: SystemResolver,
}

impl SystemHostname {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalHostname for SystemHostname {
    fn fqdn(&self) -> Result<String, ConfigError> {
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        if hostname.is_empty() {
            return Err(ConfigError::helo_unresolvable(hostname, "host name is empty"));
        }
        let resolver = self
            .resolver
            .resolver()
            .map_err(|err| ConfigError::helo_unresolvable(&hostname, err))?;
        let lookup = resolver
            .lookup_ip(hostname.as_str())
            .map_err(|err| ConfigError::helo_unresolvable(&hostname, err))?;
        let canonical = lookup
            .as_lookup()
            .records()
            .iter()
            .find(|record| matches!(record.record_type(), RecordType::A | RecordType::AAAA))
            .map(|record| record.name().to_utf8())
            .unwrap_or_else(|| lookup.query().name().to_utf8());
        Ok(canonical.trim_end_matches('.').to_string())
    }
}

/// Envelope identity used for every probe of one validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeIdentity {
    pub helo: String,
    /// Empty for the null sender.
    pub sender: String,
}

/// HELO identity, first match wins: explicit `helo_domain`, the sender's
/// domain, then the guessed host name.
pub(crate) fn resolve_identity(
    config: &ValidatorConfig,
    hostname: &dyn LocalHostname,
) -> Result<ProbeIdentity, ConfigError> {
    let sender = match config.sender() {
        Some(raw) => {
            Some(grammar::parse(raw).map_err(|source| ConfigError::invalid_sender(raw, source))?)
        }
        None => None,
    };

    let helo = if let Some(helo) = config.explicit_helo() {
        helo.to_string()
    } else if let Some(sender) = &sender {
        sender.domain().to_string()
    } else if config.guess_helo {
        hostname.fqdn()?
    } else {
        return Err(ConfigError::MissingIdentity);
    };

    Ok(ProbeIdentity {
        helo,
        sender: sender.map(|addr| addr.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHostname(Option<&'static str>);

    impl LocalHostname for FixedHostname {
        fn fqdn(&self) -> Result<String, ConfigError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ConfigError::helo_unresolvable("faff", "no such host"))
        }
    }

    #[test]
    fn explicit_helo_wins() {
        let config = ValidatorConfig::default()
            .helo_domain("example.org")
            .sender_address("probe@sender.example");
        let identity = resolve_identity(&config, &FixedHostname(None)).expect("identity");
        assert_eq!(identity.helo, "example.org");
        assert_eq!(identity.sender, "probe@sender.example");
    }

    #[test]
    fn sender_domain_is_the_helo_fallback() {
        let config = ValidatorConfig::default().sender_address("probe@sender.example");
        let identity = resolve_identity(&config, &FixedHostname(None)).expect("identity");
        assert_eq!(identity.helo, "sender.example");
    }

    #[test]
    fn null_sender_without_sender_address() {
        let config = ValidatorConfig::default().helo_domain("example.org");
        let identity = resolve_identity(&config, &FixedHostname(None)).expect("identity");
        assert_eq!(identity.sender, "");
    }

    #[test]
    fn guessed_host_name() {
        let config = ValidatorConfig::default();
        let identity =
            resolve_identity(&config, &FixedHostname(Some("faff.example.net"))).expect("identity");
        assert_eq!(identity.helo, "faff.example.net");
    }

    #[test]
    fn unresolvable_host_name_is_a_config_error() {
        let err = resolve_identity(&ValidatorConfig::default(), &FixedHostname(None))
            .expect_err("guess fails");
        assert!(matches!(err, ConfigError::HeloUnresolvable { .. }));
        assert!(err.to_string().contains("please provide one"));
    }

    #[test]
    fn no_identity_without_guessing() {
        let config = ValidatorConfig::default().guess_helo(false);
        let err = resolve_identity(&config, &FixedHostname(Some("faff.example.net")))
            .expect_err("no identity");
        assert!(matches!(err, ConfigError::MissingIdentity));
    }

    #[test]
    fn invalid_sender_is_a_config_error() {
        let config = ValidatorConfig::default()
            .sender_address(".probe@example.org")
            .helo_domain("example.org");
        let err = resolve_identity(&config, &FixedHostname(None)).expect_err("bad sender");
        match err {
            ConfigError::InvalidSender { address, .. } => assert_eq!(address, ".probe@example.org"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
