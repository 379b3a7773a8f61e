#![forbid(unsafe_code)]
//! mailprobe_lib — e-mail address validation: grammar, DNS presence, SMTP probe.
//!
//! ```no_run
//! use mailprobe_lib::{Validator, ValidatorConfig};
//!
//! let validator = Validator::new(
//!     ValidatorConfig::default()
//!         .check_mx(true)
//!         .helo_domain("example.org"),
//! );
//! let ok = validator.validate("someone@example.com")?;
//! # let _ = ok;
//! # Ok::<(), mailprobe_lib::ConfigError>(())
//! ```

pub mod debug;
pub mod dns;
pub mod grammar;
pub mod smtp;
pub mod validate;

pub use debug::DebugSink;
pub use dns::{DnsError, MailResolver, MxCandidate, SystemResolver};
pub use grammar::{Address, DomainKind, InvalidFormat, LocalPartKind, parse};
pub use smtp::{ProbeOutcome, ProbeRequest, Prober, SmtpProber, SmtpReply, Stage};
pub use validate::{
    ConfigError, LocalHostname, SystemHostname, Validator, ValidatorConfig, Verdict,
    default_config, set_default_config, validate,
};
