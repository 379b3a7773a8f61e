use std::fmt;

use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Mx,
    A,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mx => f.write_str("MX"),
            Self::A => f.write_str("A"),
        }
    }
}

/// A resolver failure other than "no such records".
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("{kind} lookup for {domain} failed: {source}")]
    Lookup {
        kind: RecordKind,
        domain: String,
        #[source]
        source: ResolveError,
    },
}

impl DnsError {
    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }

    pub fn lookup(kind: RecordKind, domain: impl Into<String>, source: ResolveError) -> Self {
        Self::Lookup {
            kind,
            domain: domain.into(),
            source,
        }
    }
}
