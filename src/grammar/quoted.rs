//! Delimited productions: `quoted-string` and `domain-literal`.
//!
//! Both share the same shape: an opening delimiter, any run of folding
//! whitespace, content characters and quoted-pairs, then the closing
//! delimiter.

use super::cursor::Cursor;

/// Whitespace allowed between content characters (`\s` in the RFC grammar).
pub(crate) fn is_wsp(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

/// `text`: anything but NUL, CR and LF. Follows a backslash in a quoted-pair.
pub(crate) fn is_text(b: u8) -> bool {
    matches!(b, 0x01..=0x09 | 0x0B | 0x0C | 0x0E..=0x7F)
}

/// `qtext`: printable ASCII minus `"` and `\`, plus the non-whitespace controls.
pub(crate) fn is_qtext(b: u8) -> bool {
    matches!(
        b,
        0x01..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x21 | 0x23..=0x5B | 0x5D..=0x7E
    )
}

/// `dtext`: printable ASCII minus `[`, `\` and `]`, plus the non-whitespace controls.
pub(crate) fn is_dtext(b: u8) -> bool {
    matches!(
        b,
        0x01..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x21..=0x5A | 0x5E..=0x7E
    )
}

pub(crate) fn scan_quoted_string(cursor: &mut Cursor<'_>) -> Result<(), usize> {
    scan_delimited(cursor, b'"', b'"', is_qtext)
}

pub(crate) fn scan_domain_literal(cursor: &mut Cursor<'_>) -> Result<(), usize> {
    scan_delimited(cursor, b'[', b']', is_dtext)
}

fn scan_delimited(
    cursor: &mut Cursor<'_>,
    open: u8,
    close: u8,
    content: fn(u8) -> bool,
) -> Result<(), usize> {
    if !cursor.eat(open) {
        return Err(cursor.position());
    }
    loop {
        let Some(byte) = cursor.peek() else {
            // unterminated
            return Err(cursor.position());
        };
        if byte == close {
            cursor.bump();
            return Ok(());
        }
        if byte == b'\\' {
            cursor.bump();
            match cursor.peek() {
                Some(escaped) if is_text(escaped) => cursor.bump(),
                _ => return Err(cursor.position()),
            }
        } else if is_wsp(byte) || content(byte) {
            cursor.bump();
        } else {
            return Err(cursor.position());
        }
    }
}
