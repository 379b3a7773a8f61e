use std::io::{self, BufReader, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::LookupIpStrategy;
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::system_conf::read_system_conf;

use crate::debug::{DebugLog, debug_line};

use super::reply::read_reply;
use super::{SmtpError, SmtpReply, Stage};

/// One client connection. Every socket operation is bounded by the
/// remaining time until `deadline`. The socket is shut down when the
/// session is dropped, whichever path the probe leaves by.
pub(crate) struct SmtpSession<'a> {
    host: String,
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    deadline: Instant,
    log: &'a DebugLog,
}

impl<'a> SmtpSession<'a> {
    pub(crate) fn connect(
        host: &str,
        port: u16,
        deadline: Instant,
        log: &'a DebugLog,
    ) -> Result<Self, SmtpError> {
        let addrs = resolve_host(host, port, deadline)?;

        let mut last_err = None;
        for addr in &addrs {
            let remaining = remaining(deadline, Stage::Connect)?;
            match TcpStream::connect_timeout(addr, remaining) {
                Ok(stream) => {
                    let reader = BufReader::new(
                        stream
                            .try_clone()
                            .map_err(|err| SmtpError::io(Stage::Connect, err))?,
                    );
                    debug_line!(log, "{host}: connected to {addr}");
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                        reader,
                        deadline,
                        log,
                    });
                }
                Err(source) => {
                    last_err = Some(SmtpError::Connect {
                        addr: addr.to_string(),
                        source,
                    })
                }
            }
        }
        Err(last_err.unwrap_or(SmtpError::NoAddress {
            host: host.to_string(),
        }))
    }

    pub(crate) fn read_reply(&mut self, stage: Stage) -> Result<SmtpReply, SmtpError> {
        let stream = &self.stream;
        let deadline = self.deadline;
        let reply = read_reply(&mut self.reader, || {
            let left = remaining(deadline, stage).map_err(|_| io::ErrorKind::TimedOut)?;
            stream.set_read_timeout(Some(left))
        })
        .map_err(|err| SmtpError::io(stage, err))?;
        for line in &reply.lines {
            debug_line!(self.log, "{} S: {} {}", self.host, reply.code, line);
        }
        Ok(reply)
    }

    pub(crate) fn command(&mut self, command: &str, stage: Stage) -> Result<SmtpReply, SmtpError> {
        debug_line!(self.log, "{} C: {}", self.host, command);
        let remaining = remaining(self.deadline, stage)?;
        self.stream
            .set_write_timeout(Some(remaining))
            .map_err(|err| SmtpError::io(stage, err))?;
        self.write_line(command)
            .map_err(|err| SmtpError::io(stage, err))?;
        self.read_reply(stage)
    }

    /// Best effort: a failing QUIT does not change the probe result.
    pub(crate) fn quit(&mut self) {
        if let Err(err) = self.command("QUIT", Stage::Quit) {
            debug_line!(self.log, "{}: QUIT failed: {err}", self.host);
        }
    }

    fn write_line(&mut self, command: &str) -> io::Result<()> {
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        self.stream.write_all(&line)?;
        self.stream.flush()
    }
}

impl Drop for SmtpSession<'_> {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Socket addresses for `host`. IP literals skip DNS; names are looked up
/// with a per-request timeout capped by what is left of the deadline.
fn resolve_host(host: &str, port: u16, deadline: Instant) -> Result<Vec<SocketAddr>, SmtpError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let left = remaining(deadline, Stage::Connect)?;
    let (config, mut opts) =
        read_system_conf().map_err(|err| SmtpError::io(Stage::Connect, err))?;
    opts.timeout = left;
    opts.attempts = 1;
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    let resolver = Resolver::new(config, opts).map_err(|err| SmtpError::io(Stage::Connect, err))?;

    let lookup = match resolver.lookup_ip(host) {
        Ok(lookup) => lookup,
        Err(err) => {
            return Err(match err.kind() {
                ResolveErrorKind::Timeout => SmtpError::Timeout {
                    stage: Stage::Connect,
                },
                ResolveErrorKind::NoRecordsFound { .. } => SmtpError::NoAddress {
                    host: host.to_string(),
                },
                _ => SmtpError::Resolve {
                    host: host.to_string(),
                    source: err,
                },
            });
        }
    };
    // the lookup may have used up the budget across several name servers
    remaining(deadline, Stage::Connect)?;

    let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect();
    if addrs.is_empty() {
        return Err(SmtpError::NoAddress {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}

/// `now + timeout`, clamped so that huge timeouts cannot overflow `Instant`.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(MAX_BUDGET))
        .unwrap_or(now)
}

/// Upper bound applied when a timeout does not fit in an `Instant`.
const MAX_BUDGET: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn remaining(deadline: Instant, stage: Stage) -> Result<Duration, SmtpError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(SmtpError::Timeout { stage })
    } else {
        Ok(left)
    }
}
