use std::fmt;
use std::io::{self, BufRead};

/// A complete (possibly multi-line) SMTP reply.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![message.into()],
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn message(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lines.first() {
            Some(first) if !first.is_empty() => write!(f, "{} {}", self.code, first),
            _ => write!(f, "{}", self.code),
        }
    }
}

/// Longest reply line accepted, CRLF included (RFC 5321 §4.5.3.1.5).
pub(crate) const MAX_REPLY_LINE: usize = 512;

/// Reads one reply, following `NNN-` continuation lines until `NNN ` (or a
/// bare `NNN`).
///
/// `before_read` runs before every read from the underlying stream; an
/// error from it aborts the reply.
pub(crate) fn read_reply<R, F>(reader: &mut R, mut before_read: F) -> io::Result<SmtpReply>
where
    R: BufRead,
    F: FnMut() -> io::Result<()>,
{
    let mut code = None;
    let mut lines = Vec::new();
    loop {
        let raw = read_line(reader, &mut before_read)?;

        let code_part = raw.get(..3).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid SMTP reply: '{raw}'"),
            )
        })?;
        if !code_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid SMTP status code: '{code_part}'"),
            ));
        }
        let parsed: u16 = code_part.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid SMTP status code: '{code_part}'"),
            )
        })?;
        match code {
            Some(existing) if existing != parsed => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("inconsistent SMTP reply codes: {existing} vs {parsed}"),
                ));
            }
            Some(_) => {}
            None => code = Some(parsed),
        }

        let continuation = raw.as_bytes().get(3) == Some(&b'-');
        lines.push(raw.get(4..).unwrap_or_default().to_string());
        if !continuation {
            return Ok(SmtpReply { code: parsed, lines });
        }
    }
}

/// One line without its terminator, at most [`MAX_REPLY_LINE`] bytes.
fn read_line<R, F>(reader: &mut R, before_read: &mut F) -> io::Result<String>
where
    R: BufRead,
    F: FnMut() -> io::Result<()>,
{
    let mut line = Vec::new();
    loop {
        before_read()?;
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed while reading reply",
            ));
        }
        let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (&available[..=end], true),
            None => (available, false),
        };
        let used = chunk.len();
        line.extend_from_slice(chunk);
        reader.consume(used);

        if line.len() > MAX_REPLY_LINE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("SMTP reply line longer than {MAX_REPLY_LINE} bytes"),
            ));
        }
        if done {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return Ok(String::from_utf8_lossy(&line).into_owned());
        }
    }
}
