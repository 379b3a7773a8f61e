//! Validation pipeline: format, DNS presence, then SMTP probing.
//!
//! ```text
//! parse ──✗──> InvalidFormat
//!   │ (checks off) ─> WellFormed
//!   ▼
//! MX ∪ A present? ──✗──> NoMailInfrastructure
//!   │ (check_mx off) ─> MailInfrastructure
//!   ▼
//! for each candidate (MX by preference, else A):
//!   accept ─> Accepted    fatal ─> Rejected    timeout/unknown ─> next
//! exhausted ─> FailSafe
//! ```

mod config;
mod error;
mod identity;
mod verdict;

use std::sync::Arc;

pub use config::{ValidatorConfig, default_config, set_default_config};
pub use error::ConfigError;
pub use identity::{LocalHostname, SystemHostname};
pub use verdict::Verdict;

use crate::debug::{DebugLog, DebugSink, debug_line};
use crate::dns::{self, MailResolver, SystemResolver};
use crate::grammar::{self, Address};
use crate::smtp::{ProbeOutcome, ProbeRequest, Prober, SmtpProber};
use identity::{ProbeIdentity, resolve_identity};

/// Validates `address` with the process-wide default configuration.
///
/// Returns `Err` only for configuration problems; every address-quality
/// outcome is a boolean.
pub fn validate(address: &str) -> Result<bool, ConfigError> {
    Validator::new(default_config()).validate(address)
}

/// A validation policy bound to its collaborators. Cheap to share across
/// threads; each call only reads the validator.
#[derive(Clone)]
pub struct Validator {
    config: ValidatorConfig,
    resolver: Arc<dyn MailResolver>,
    prober: Arc<dyn Prober>,
    hostname: Arc<dyn LocalHostname>,
    log: DebugLog,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(default_config())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Validator using the system resolver, plain SMTP probes and the
    /// local host name. No debug sink.
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(SystemResolver::new()),
            prober: Arc::new(SmtpProber),
            hostname: Arc::new(SystemHostname::new()),
            log: DebugLog::disabled(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl MailResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_prober(mut self, prober: impl Prober + 'static) -> Self {
        self.prober = Arc::new(prober);
        self
    }

    pub fn with_hostname(mut self, hostname: impl LocalHostname + 'static) -> Self {
        self.hostname = Arc::new(hostname);
        self
    }

    pub fn with_debug_sink(mut self, sink: impl DebugSink + 'static) -> Self {
        self.log = DebugLog::new(Arc::new(sink));
        self
    }

    pub fn without_debug_sink(mut self) -> Self {
        self.log = DebugLog::disabled();
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, address: &str) -> Result<bool, ConfigError> {
        self.verdict(address).map(|verdict| verdict.is_valid())
    }

    /// Runs the pipeline and reports which branch decided.
    pub fn verdict(&self, address: &str) -> Result<Verdict, ConfigError> {
        let parsed = match grammar::parse(address) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug_line!(self.log, "{address:?} is not a valid address: {error}");
                return Ok(Verdict::InvalidFormat { error });
            }
        };

        if !self.config.dns_stage_enabled() {
            return Ok(Verdict::WellFormed);
        }

        let identity = if self.config.check_mx {
            Some(resolve_identity(&self.config, self.hostname.as_ref())?)
        } else {
            None
        };

        if !self.has_mail_infrastructure(parsed.domain()) {
            return Ok(Verdict::NoMailInfrastructure);
        }

        match identity {
            Some(identity) => Ok(self.probe_candidates(&parsed, &identity)),
            None => Ok(Verdict::MailInfrastructure),
        }
    }

    fn has_mail_infrastructure(&self, domain: &str) -> bool {
        let mx = self.mx_records(domain);
        if !mx.is_empty() {
            debug_line!(self.log, "{domain}: {} MX record(s)", mx.len());
            return true;
        }
        let a = self.a_records(domain);
        if !a.is_empty() {
            debug_line!(self.log, "{domain}: {} A record(s)", a.len());
            return true;
        }
        debug_line!(self.log, "{domain}: no MX or A records");
        false
    }

    /// Candidate hosts: MX exchanges by preference, else the domain's A records.
    fn candidates(&self, domain: &str) -> Vec<String> {
        let mx = self.mx_records(domain);
        if !mx.is_empty() {
            debug_line!(self.log, "{domain}: {} candidate(s) from MX records", mx.len());
            return mx.into_iter().map(|record| record.host).collect();
        }
        let a = self.a_records(domain);
        debug_line!(self.log, "{domain}: {} candidate(s) from A records", a.len());
        a
    }

    fn probe_candidates(&self, address: &Address, identity: &ProbeIdentity) -> Verdict {
        let recipient = address.to_string();
        let mut tried = Vec::new();
        for host in self.candidates(address.domain()) {
            debug_line!(self.log, "Checking {recipient} with {host}");
            let outcome = self.prober.probe(&ProbeRequest {
                recipient: &recipient,
                host: &host,
                sender: &identity.sender,
                helo: &identity.helo,
                port: self.config.port,
                timeout: self.config.timeout,
                log: &self.log,
            });
            debug_line!(self.log, "{host}: {} ({outcome})", outcome.category());
            match outcome {
                ProbeOutcome::Accept => return Verdict::Accepted { host },
                ProbeOutcome::Fatal { stage, reply } => {
                    return Verdict::Rejected { host, stage, reply };
                }
                ProbeOutcome::Timeout { .. } | ProbeOutcome::Unknown { .. } => tried.push(host),
            }
        }
        self.fail_safe(address.domain(), tried)
    }

    fn fail_safe(&self, domain: &str, tried: Vec<String>) -> Verdict {
        debug_line!(
            self.log,
            "{domain}: no verdict from {} candidate(s); assuming the address is deliverable",
            tried.len()
        );
        Verdict::FailSafe { tried }
    }

    /// Lookup failures are logged, then treated like an empty answer.
    fn mx_records(&self, domain: &str) -> Vec<dns::MxCandidate> {
        dns::sorted_mx(self.resolver.as_ref(), domain).unwrap_or_else(|err| {
            tracing::warn!(target: "mailprobe", %domain, error = %err, "MX lookup failed");
            debug_line!(self.log, "{err}");
            Vec::new()
        })
    }

    fn a_records(&self, domain: &str) -> Vec<String> {
        self.resolver.lookup_a(domain).unwrap_or_else(|err| {
            tracing::warn!(target: "mailprobe", %domain, error = %err, "A lookup failed");
            debug_line!(self.log, "{err}");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests;
