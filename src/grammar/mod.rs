//! Address grammar (RFC 2822 `addr-spec`, ASCII subset).
//!
//! [`parse`] checks the whole input against the grammar and hands back the
//! local part and domain as an [`Address`].

mod atom;
mod cursor;
mod error;
mod quoted;

use std::fmt;
use std::str::FromStr;

pub use error::InvalidFormat;

use cursor::Cursor;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPartKind {
    DotAtom,
    Quoted,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    DotAtom,
    Literal,
}

/// A grammar-valid address split at its `@`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    local_part: String,
    domain: String,
    local_kind: LocalPartKind,
    domain_kind: DomainKind,
}

impl Address {
    /// The local part exactly as written, quotes included.
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn local_kind(&self) -> LocalPartKind {
        self.local_kind
    }

    pub fn domain_kind(&self) -> DomainKind {
        self.domain_kind
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

impl FromStr for Address {
    type Err = InvalidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses `address` as `local-part "@" domain`, anchored at both ends.
///
/// Surrounding whitespace is not trimmed: `" a@b"` is rejected.
pub fn parse(address: &str) -> Result<Address, InvalidFormat> {
    if address.is_empty() {
        return Err(InvalidFormat::Empty);
    }

    let mut cursor = Cursor::new(address);

    let local_kind = if cursor.peek() == Some(b'"') {
        quoted::scan_quoted_string(&mut cursor)
            .map_err(|position| InvalidFormat::LocalPart { position })?;
        LocalPartKind::Quoted
    } else {
        atom::scan_dot_atom(&mut cursor).map_err(|position| InvalidFormat::LocalPart { position })?;
        LocalPartKind::DotAtom
    };

    let at = cursor.position();
    if !cursor.eat(b'@') {
        return Err(InvalidFormat::MissingAt { position: at });
    }

    let domain_start = cursor.position();
    let domain_kind = if cursor.peek() == Some(b'[') {
        quoted::scan_domain_literal(&mut cursor)
            .map_err(|position| InvalidFormat::Domain { position })?;
        DomainKind::Literal
    } else {
        atom::scan_dot_atom(&mut cursor).map_err(|position| InvalidFormat::Domain { position })?;
        DomainKind::DotAtom
    };

    if !cursor.at_end() {
        return Err(InvalidFormat::TrailingInput {
            position: cursor.position(),
        });
    }

    Ok(Address {
        local_part: address[..at].to_string(),
        domain: address[domain_start..].to_string(),
        local_kind,
        domain_kind,
    })
}
