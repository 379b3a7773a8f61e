use super::cursor::Cursor;

/// `atext`: ASCII letters, digits and the RFC 2822 specials allowed in atoms.
pub(crate) fn is_atext(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'/'
                | b'='
                | b'?'
                | b'^'
                | b'_'
                | b'`'
                | b'{'
                | b'|'
                | b'}'
                | b'~'
        )
}

/// Consumes a `dot-atom`: atext runs joined by single dots.
///
/// On failure returns the offset of the offending byte (a leading, doubled
/// or trailing dot, or a missing atom).
pub(crate) fn scan_dot_atom(cursor: &mut Cursor<'_>) -> Result<(), usize> {
    loop {
        if cursor.eat_while(is_atext) == 0 {
            return Err(cursor.position());
        }
        if !cursor.eat(b'.') {
            return Ok(());
        }
    }
}
