use std::sync::OnceLock;

use trust_dns_resolver::Resolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use super::{DnsError, MailResolver, MxCandidate, RecordKind};

/// [`MailResolver`] backed by the system resolver configuration
/// (`/etc/resolv.conf`, hosts file).
///
/// The underlying resolver is built on first use, so a validator that never
/// reaches the DNS stage never reads the system configuration.
#[derive(Default)]
pub struct SystemResolver {
    inner: OnceLock<Resolver>,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn resolver(&self) -> Result<&Resolver, DnsError> {
        if let Some(resolver) = self.inner.get() {
            return Ok(resolver);
        }
        let built = Resolver::from_system_conf().map_err(DnsError::resolver_init)?;
        Ok(self.inner.get_or_init(|| built))
    }
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver")
            .field("initialized", &self.inner.get().is_some())
            .finish()
    }
}

impl MailResolver for SystemResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxCandidate>, DnsError> {
        let lookup = match self.resolver()?.mx_lookup(domain) {
            Ok(lookup) => lookup,
            Err(err) if is_no_records(&err) => return Ok(Vec::new()),
            Err(err) => return Err(DnsError::lookup(RecordKind::Mx, domain, err)),
        };
        Ok(lookup
            .iter()
            .map(|mx| {
                MxCandidate::new(mx.preference(), normalize_exchange(&mx.exchange().to_utf8()))
            })
            .collect())
    }

    fn lookup_a(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        match self.resolver()?.ipv4_lookup(domain) {
            Ok(lookup) => Ok(lookup.iter().map(|a| a.to_string()).collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(DnsError::lookup(RecordKind::A, domain, err)),
        }
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}
