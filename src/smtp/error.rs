use std::io;

use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

use super::{SmtpReply, Stage};

/// Why a probe session stopped before the recipient was accepted.
#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: ResolveError,
    },
    #[error("no socket address for {host}")]
    NoAddress { host: String },
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out during {stage}")]
    Timeout { stage: Stage },
    #[error("I/O error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: io::Error,
    },
    #[error("protocol error during {stage}: {message}")]
    Protocol { stage: Stage, message: String },
    #[error("{stage} rejected permanently: {reply}")]
    Permanent { stage: Stage, reply: SmtpReply },
    #[error("{stage} rejected temporarily: {reply}")]
    Transient { stage: Stage, reply: SmtpReply },
    #[error("unexpected reply to {stage}: {reply}")]
    Unexpected { stage: Stage, reply: SmtpReply },
}

impl SmtpError {
    /// Maps a socket error to a timeout, a protocol error or plain I/O.
    pub(crate) fn io(stage: Stage, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout { stage },
            io::ErrorKind::InvalidData => Self::Protocol {
                stage,
                message: source.to_string(),
            },
            _ => Self::Io { stage, source },
        }
    }

    /// Checks that `reply` is a 2xx completion for `stage`.
    pub(crate) fn expect_positive(stage: Stage, reply: SmtpReply) -> Result<SmtpReply, Self> {
        if reply.is_positive_completion() {
            Ok(reply)
        } else if reply.is_permanent_failure() {
            Err(Self::Permanent { stage, reply })
        } else if reply.is_transient_failure() {
            Err(Self::Transient { stage, reply })
        } else {
            Err(Self::Unexpected { stage, reply })
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Connect { source, .. } => {
                matches!(
                    source.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                )
            }
            _ => false,
        }
    }
}
