//! SMTP probe: a partial transaction against one candidate host.
//!
//! The dialogue stops after `RCPT TO`; no `DATA` is ever sent. The outcome
//! is reduced to one of four [`ProbeOutcome`] categories.

mod error;
mod reply;
mod session;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use error::SmtpError;
pub use reply::SmtpReply;

use crate::debug::DebugLog;
use session::SmtpSession;

pub const DEFAULT_PORT: u16 = 25;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Greeting,
    Ehlo,
    Helo,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::Helo => "HELO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// Result of probing one host.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The recipient was accepted.
    Accept,
    /// A 5xx reply: the server refuses this address (or us) for good.
    Fatal { stage: Stage, reply: SmtpReply },
    /// The probe ran out of time.
    Timeout { stage: Stage },
    /// Anything else: 4xx replies, refused connections, garbled replies.
    Unknown { reason: String },
}

impl ProbeOutcome {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Fatal { .. } => "fatal",
            Self::Timeout { .. } => "timeout",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Timeouts and unknown errors let the caller move on to the next host.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unknown { .. })
    }
}

impl From<SmtpError> for ProbeOutcome {
    fn from(err: SmtpError) -> Self {
        if err.is_timeout() {
            let stage = match &err {
                SmtpError::Timeout { stage } => *stage,
                _ => Stage::Connect,
            };
            return Self::Timeout { stage };
        }
        match err {
            SmtpError::Permanent { stage, reply } => Self::Fatal { stage, reply },
            other => Self::Unknown {
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accepted"),
            Self::Fatal { stage, reply } => write!(f, "fatal: {stage} rejected with {reply}"),
            Self::Timeout { stage } => write!(f, "timed out during {stage}"),
            Self::Unknown { reason } => write!(f, "unknown error: {reason}"),
        }
    }
}

/// Everything one probe needs.
#[derive(Debug, Clone)]
pub struct ProbeRequest<'a> {
    /// Full recipient address, sent in `RCPT TO`.
    pub recipient: &'a str,
    /// Host name or IP literal to connect to.
    pub host: &'a str,
    /// Envelope sender; empty means the null sender `<>`.
    pub sender: &'a str,
    pub helo: &'a str,
    pub port: u16,
    /// Budget for the whole session, connect included.
    pub timeout: Duration,
    pub log: &'a DebugLog,
}

pub trait Prober: Send + Sync {
    fn probe(&self, request: &ProbeRequest<'_>) -> ProbeOutcome;
}

impl<T: Prober + ?Sized> Prober for Arc<T> {
    fn probe(&self, request: &ProbeRequest<'_>) -> ProbeOutcome {
        (**self).probe(request)
    }
}

/// [`Prober`] speaking SMTP over a plain TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpProber;

impl Prober for SmtpProber {
    fn probe(&self, request: &ProbeRequest<'_>) -> ProbeOutcome {
        match run_session(request) {
            Ok(()) => ProbeOutcome::Accept,
            Err(err) => ProbeOutcome::from(err),
        }
    }
}

fn run_session(request: &ProbeRequest<'_>) -> Result<(), SmtpError> {
    let deadline = session::deadline_after(request.timeout);
    let mut session = SmtpSession::connect(request.host, request.port, deadline, request.log)?;

    let greeting = session.read_reply(Stage::Greeting)?;
    SmtpError::expect_positive(Stage::Greeting, greeting)?;

    let ehlo = session.command(&format!("EHLO {}", request.helo), Stage::Ehlo)?;
    if !ehlo.is_positive_completion() {
        // pre-ESMTP server
        let helo = session.command(&format!("HELO {}", request.helo), Stage::Helo)?;
        SmtpError::expect_positive(Stage::Helo, helo)?;
    }

    let mail = session.command(&format!("MAIL FROM:<{}>", request.sender), Stage::MailFrom)?;
    SmtpError::expect_positive(Stage::MailFrom, mail)?;

    let rcpt = session.command(&format!("RCPT TO:<{}>", request.recipient), Stage::RcptTo)?;
    SmtpError::expect_positive(Stage::RcptTo, rcpt)?;

    session.quit();
    Ok(())
}
