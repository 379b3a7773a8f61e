//! DNS adapter: MX and A lookups for the candidate hosts of a domain.

mod error;
mod resolver;
mod types;

use std::sync::Arc;

pub use error::{DnsError, RecordKind};
pub use resolver::SystemResolver;
pub use types::MxCandidate;

/// Mail-exchange lookups. "No records" is an empty list, never an error.
pub trait MailResolver: Send + Sync {
    /// MX records in resolver order.
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxCandidate>, DnsError>;

    /// IPv4 addresses of `domain`, as dotted-quad strings.
    fn lookup_a(&self, domain: &str) -> Result<Vec<String>, DnsError>;
}

impl<T: MailResolver + ?Sized> MailResolver for Arc<T> {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxCandidate>, DnsError> {
        (**self).lookup_mx(domain)
    }

    fn lookup_a(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        (**self).lookup_a(domain)
    }
}

/// MX records for `domain`, ascending preference. The sort is stable, so
/// equal preferences keep the order the resolver returned them in.
pub fn sorted_mx<R>(resolver: &R, domain: &str) -> Result<Vec<MxCandidate>, DnsError>
where
    R: MailResolver + ?Sized,
{
    let mut records = resolver.lookup_mx(domain)?;
    records.sort_by_key(|record| record.preference);
    Ok(records)
}
