use thiserror::Error;

/// The address does not match the `addr-spec` grammar.
///
/// Every variant carries the byte offset at which the parser gave up, which is
/// handy when echoing the input back to a user.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFormat {
    #[error("address is empty")]
    Empty,
    #[error("invalid local part at byte {position}")]
    LocalPart { position: usize },
    #[error("expected '@' at byte {position}")]
    MissingAt { position: usize },
    #[error("invalid domain at byte {position}")]
    Domain { position: usize },
    #[error("unexpected trailing input at byte {position}")]
    TrailingInput { position: usize },
}

impl InvalidFormat {
    pub fn position(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::LocalPart { position }
            | Self::MissingAt { position }
            | Self::Domain { position }
            | Self::TrailingInput { position } => *position,
        }
    }
}
