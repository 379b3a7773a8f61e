use std::fmt;

use crate::grammar::InvalidFormat;
use crate::smtp::{SmtpReply, Stage};

/// The branch of the validation pipeline that decided the result.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "verdict", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The address does not match the grammar.
    InvalidFormat { error: InvalidFormat },
    /// Grammar only (network checks disabled).
    WellFormed,
    /// Neither MX nor A records exist for the domain.
    NoMailInfrastructure,
    /// MX or A records exist; SMTP probing disabled.
    MailInfrastructure,
    /// A mail exchanger accepted the recipient.
    Accepted { host: String },
    /// A mail exchanger permanently refused the probe.
    Rejected {
        host: String,
        stage: Stage,
        reply: SmtpReply,
    },
    /// No candidate gave a definite answer. Presumed deliverable: transient
    /// infrastructure trouble is not evidence against the address.
    FailSafe { tried: Vec<String> },
}

impl Verdict {
    /// Stable snake_case name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::WellFormed => "well_formed",
            Self::NoMailInfrastructure => "no_mail_infrastructure",
            Self::MailInfrastructure => "mail_infrastructure",
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::FailSafe { .. } => "fail_safe",
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::WellFormed
            | Self::MailInfrastructure
            | Self::Accepted { .. }
            | Self::FailSafe { .. } => true,
            Self::InvalidFormat { .. } | Self::NoMailInfrastructure | Self::Rejected { .. } => false,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat { error } => write!(f, "invalid format: {error}"),
            Self::WellFormed => f.write_str("well formed"),
            Self::NoMailInfrastructure => f.write_str("no MX or A records"),
            Self::MailInfrastructure => f.write_str("domain has mail infrastructure"),
            Self::Accepted { host } => write!(f, "accepted by {host}"),
            Self::Rejected { host, stage, reply } => {
                write!(f, "rejected by {host} at {stage}: {reply}")
            }
            Self::FailSafe { tried } if tried.is_empty() => {
                f.write_str("no candidate answered; presumed deliverable")
            }
            Self::FailSafe { tried } => write!(
                f,
                "no verdict from {}; presumed deliverable",
                tried.join(", ")
            ),
        }
    }
}
