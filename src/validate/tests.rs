use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::*;
use crate::dns::tests::StubResolver;
use crate::dns::{DnsError, MxCandidate, RecordKind};
use crate::smtp::{SmtpReply, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    recipient: String,
    host: String,
    sender: String,
    helo: String,
    port: u16,
    timeout: Duration,
}

/// Answers each probe from a closure over the host name and records the request.
struct StubProber {
    respond: Box<dyn Fn(&str) -> ProbeOutcome + Send + Sync>,
    calls: Mutex<Vec<Call>>,
}

impl StubProber {
    fn new(respond: impl Fn(&str) -> ProbeOutcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn hosts(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.host).collect()
    }
}

impl Prober for StubProber {
    fn probe(&self, request: &ProbeRequest<'_>) -> ProbeOutcome {
        self.calls.lock().expect("calls lock").push(Call {
            recipient: request.recipient.to_string(),
            host: request.host.to_string(),
            sender: request.sender.to_string(),
            helo: request.helo.to_string(),
            port: request.port,
            timeout: request.timeout,
        });
        (self.respond)(request.host)
    }
}

struct FixedHostname(Option<&'static str>);

impl LocalHostname for FixedHostname {
    fn fqdn(&self) -> Result<String, ConfigError> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| ConfigError::helo_unresolvable("faff", "no such host"))
    }
}

fn accept(_: &str) -> ProbeOutcome {
    ProbeOutcome::Accept
}

fn timeout(_: &str) -> ProbeOutcome {
    ProbeOutcome::Timeout {
        stage: Stage::Connect,
    }
}

fn rejected() -> ProbeOutcome {
    ProbeOutcome::Fatal {
        stage: Stage::RcptTo,
        reply: SmtpReply::new(550, "5.1.1 no such user"),
    }
}

fn example_mx() -> StubResolver {
    StubResolver::new().with_mx(
        "example.com",
        vec![
            MxCandidate::new(20, "mx2.example.com"),
            MxCandidate::new(10, "mx1.example.com"),
        ],
    )
}

fn mx_config() -> ValidatorConfig {
    ValidatorConfig::default()
        .check_mx(true)
        .helo_domain("example.org")
}

fn validator(
    config: ValidatorConfig,
    resolver: &Arc<StubResolver>,
    prober: &Arc<StubProber>,
) -> Validator {
    Validator::new(config)
        .with_resolver(Arc::clone(resolver))
        .with_prober(Arc::clone(prober))
        .with_hostname(FixedHostname(None))
}

fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let sink = move |line: &str| captured.lock().expect("lines lock").push(line.to_string());
    (lines, sink)
}

#[test]
fn format_only_touches_no_network() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = validator(ValidatorConfig::default(), &resolver, &prober);

    assert_eq!(v.verdict("user@example.com").unwrap(), Verdict::WellFormed);
    assert!(!v.validate("user@@example.com").unwrap());
    assert!(resolver.queries().is_empty());
    assert!(prober.calls().is_empty());
}

#[test]
fn invalid_format_short_circuits() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    // no identity either: the format stage decides before identity is needed
    let config = ValidatorConfig::default().check_mx(true).guess_helo(false);
    let v = validator(config, &resolver, &prober);

    let verdict = v.verdict("user.@example.com").unwrap();
    assert!(matches!(verdict, Verdict::InvalidFormat { .. }));
    assert!(!verdict.is_valid());
    assert!(resolver.queries().is_empty());
    assert!(prober.calls().is_empty());
}

#[test]
fn dns_check_with_mx_skips_a_lookup() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = validator(ValidatorConfig::default().check_dns(true), &resolver, &prober);

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::MailInfrastructure
    );
    assert_eq!(resolver.count(RecordKind::Mx), 1);
    assert_eq!(resolver.count(RecordKind::A), 0);
    assert!(prober.calls().is_empty());
}

#[test]
fn dns_check_falls_back_to_a_records() {
    let resolver = Arc::new(StubResolver::new().with_a("example.com", ["10.20.30.40"]));
    let prober = StubProber::new(accept);
    let v = validator(ValidatorConfig::default().check_dns(true), &resolver, &prober);

    assert!(v.validate("user@example.com").unwrap());
    assert_eq!(resolver.count(RecordKind::A), 1);
}

#[test]
fn no_records_is_invalid() {
    let resolver = Arc::new(StubResolver::new());
    let prober = StubProber::new(accept);
    let v = validator(mx_config(), &resolver, &prober);

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::NoMailInfrastructure
    );
    assert!(prober.calls().is_empty());
}

#[test]
fn resolver_failure_counts_as_no_records() {
    let resolver = Arc::new(StubResolver::new().failing("example.com"));
    let prober = StubProber::new(accept);
    let (lines, sink) = capture();
    let v = validator(ValidatorConfig::default().check_dns(true), &resolver, &prober)
        .with_debug_sink(sink);

    assert!(!v.validate("user@example.com").unwrap());
    let lines = lines.lock().expect("lines lock");
    assert!(
        lines
            .iter()
            .any(|line| line == "MX lookup for example.com failed: SERVFAIL")
    );
    assert!(lines.iter().any(|line| line.starts_with("A lookup for example.com failed")));
}

#[test]
fn mx_candidates_probed_in_preference_order() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(timeout);
    let v = validator(mx_config(), &resolver, &prober);

    v.validate("user@example.com").unwrap();
    assert_eq!(prober.hosts(), vec!["mx1.example.com", "mx2.example.com"]);
}

#[test]
fn equal_preferences_keep_resolver_order() {
    let resolver = Arc::new(StubResolver::new().with_mx(
        "example.com",
        vec![
            MxCandidate::new(10, "b.example.com"),
            MxCandidate::new(5, "first.example.com"),
            MxCandidate::new(10, "a.example.com"),
        ],
    ));
    let prober = StubProber::new(timeout);
    let v = validator(mx_config(), &resolver, &prober);

    v.validate("user@example.com").unwrap();
    assert_eq!(
        prober.hosts(),
        vec!["first.example.com", "b.example.com", "a.example.com"]
    );
}

#[test]
fn accept_stops_iteration() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = validator(mx_config(), &resolver, &prober);

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::Accepted {
            host: "mx1.example.com".into()
        }
    );
    assert_eq!(prober.hosts(), vec!["mx1.example.com"]);
}

#[test]
fn fatal_stops_iteration() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(|_| rejected());
    let v = validator(mx_config(), &resolver, &prober);

    let verdict = v.verdict("user@example.com").unwrap();
    assert_eq!(
        verdict,
        Verdict::Rejected {
            host: "mx1.example.com".into(),
            stage: Stage::RcptTo,
            reply: SmtpReply::new(550, "5.1.1 no such user"),
        }
    );
    assert!(!verdict.is_valid());
    assert_eq!(prober.hosts(), vec!["mx1.example.com"]);
}

#[test]
fn transient_failure_moves_to_next_candidate() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(|host| match host {
        "mx1.example.com" => ProbeOutcome::Unknown {
            reason: "connection refused".into(),
        },
        _ => rejected(),
    });
    let v = validator(mx_config(), &resolver, &prober);

    assert!(!v.validate("user@example.com").unwrap());
    assert_eq!(prober.hosts(), vec!["mx1.example.com", "mx2.example.com"]);
}

#[test]
fn all_transient_is_fail_safe() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(timeout);
    let v = validator(mx_config(), &resolver, &prober);

    let verdict = v.verdict("user@example.com").unwrap();
    assert_eq!(
        verdict,
        Verdict::FailSafe {
            tried: vec!["mx1.example.com".into(), "mx2.example.com".into()]
        }
    );
    assert!(verdict.is_valid());
}

#[test]
fn a_records_are_candidates_without_mx() {
    let resolver = Arc::new(StubResolver::new().with_a("example.com", ["10.20.30.40"]));
    let prober = StubProber::new(accept);
    let v = validator(mx_config(), &resolver, &prober);

    assert!(v.validate("user@example.com").unwrap());
    assert_eq!(
        prober.calls(),
        vec![Call {
            recipient: "user@example.com".into(),
            host: "10.20.30.40".into(),
            sender: String::new(),
            helo: "example.org".into(),
            port: 25,
            timeout: Duration::from_secs(5),
        }]
    );
}

fn single_mx() -> Arc<StubResolver> {
    Arc::new(StubResolver::new().with_mx(
        "example.com",
        vec![MxCandidate::new(10, "mx1.example.com")],
    ))
}

#[test]
fn single_unknown_candidate_is_fail_safe() {
    let resolver = single_mx();
    let prober = StubProber::new(|_| ProbeOutcome::Unknown {
        reason: "connection reset".into(),
    });
    let v = validator(mx_config(), &resolver, &prober);

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::FailSafe {
            tried: vec!["mx1.example.com".into()]
        }
    );
    assert!(v.validate("user@example.com").unwrap());
}

#[test]
fn single_timeout_candidate_is_fail_safe() {
    let resolver = single_mx();
    let prober = StubProber::new(timeout);
    let v = validator(mx_config(), &resolver, &prober);

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::FailSafe {
            tried: vec!["mx1.example.com".into()]
        }
    );
}

#[test]
fn single_fatal_candidate_is_invalid() {
    let resolver = single_mx();
    let prober = StubProber::new(|_| rejected());
    let v = validator(mx_config(), &resolver, &prober);

    assert!(!v.validate("user@example.com").unwrap());
    assert_eq!(prober.hosts(), vec!["mx1.example.com"]);
}

#[test]
fn outcome_lines_name_the_category() {
    let resolver = single_mx();
    let prober = StubProber::new(|_| rejected());
    let (lines, sink) = capture();
    let v = validator(mx_config(), &resolver, &prober).with_debug_sink(sink);

    v.validate("user@example.com").unwrap();
    let lines = lines.lock().expect("lines lock");
    assert!(lines.iter().any(|line| {
        line == "mx1.example.com: fatal (fatal: RCPT TO rejected with 550 5.1.1 no such user)"
    }));
}

/// MX records on the presence check, nothing on the candidate fetch.
struct VanishingResolver {
    mx_calls: AtomicUsize,
}

impl MailResolver for VanishingResolver {
    fn lookup_mx(&self, _domain: &str) -> Result<Vec<MxCandidate>, DnsError> {
        if self.mx_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![MxCandidate::new(10, "mx1.example.com")])
        } else {
            Ok(Vec::new())
        }
    }

    fn lookup_a(&self, _domain: &str) -> Result<Vec<String>, DnsError> {
        Ok(Vec::new())
    }
}

#[test]
fn empty_candidate_list_is_fail_safe() {
    let prober = StubProber::new(accept);
    let v = Validator::new(mx_config())
        .with_resolver(VanishingResolver {
            mx_calls: AtomicUsize::new(0),
        })
        .with_prober(Arc::clone(&prober));

    assert_eq!(
        v.verdict("user@example.com").unwrap(),
        Verdict::FailSafe { tried: Vec::new() }
    );
    assert!(prober.calls().is_empty());
}

#[test]
fn probe_uses_configured_identity_and_transport() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let config = mx_config()
        .sender_address("postmaster@example.org")
        .port(2525)
        .timeout(Duration::from_secs(2));
    let v = validator(config, &resolver, &prober);

    v.validate("\"odd user\"@example.com").unwrap();
    let call = &prober.calls()[0];
    assert_eq!(call.recipient, "\"odd user\"@example.com");
    assert_eq!(call.sender, "postmaster@example.org");
    assert_eq!(call.helo, "example.org");
    assert_eq!(call.port, 2525);
    assert_eq!(call.timeout, Duration::from_secs(2));
}

#[test]
fn guessed_helo_is_used_when_nothing_is_configured() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = Validator::new(ValidatorConfig::default().check_mx(true))
        .with_resolver(Arc::clone(&resolver))
        .with_prober(Arc::clone(&prober))
        .with_hostname(FixedHostname(Some("faff.example.net")));

    assert!(v.validate("user@example.com").unwrap());
    assert_eq!(prober.calls()[0].helo, "faff.example.net");
}

#[test]
fn missing_identity_fails_before_any_lookup() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = validator(
        ValidatorConfig::default().check_mx(true).guess_helo(false),
        &resolver,
        &prober,
    );

    let err = v.validate("user@example.com").unwrap_err();
    assert!(matches!(err, ConfigError::MissingIdentity));
    assert!(resolver.queries().is_empty());
}

#[test]
fn unresolvable_hostname_is_a_config_error() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let v = validator(ValidatorConfig::default().check_mx(true), &resolver, &prober);

    let err = v.validate("user@example.com").unwrap_err();
    assert!(matches!(err, ConfigError::HeloUnresolvable { .. }));
    assert!(prober.calls().is_empty());
}

#[test]
fn dns_only_check_needs_no_identity() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let config = ValidatorConfig::default().check_dns(true).guess_helo(false);
    let v = validator(config, &resolver, &prober);

    assert!(v.validate("user@example.com").unwrap());
}

#[test]
fn debug_transcript() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(|host| match host {
        "mx1.example.com" => ProbeOutcome::Timeout {
            stage: Stage::Connect,
        },
        _ => ProbeOutcome::Accept,
    });
    let (lines, sink) = capture();
    let v = validator(mx_config(), &resolver, &prober).with_debug_sink(sink);

    assert!(v.validate("user@example.com").unwrap());
    let transcript = lines.lock().expect("lines lock").join("\n");
    insta::assert_snapshot!(transcript, @r"
    example.com: 2 MX record(s)
    example.com: 2 candidate(s) from MX records
    Checking user@example.com with mx1.example.com
    mx1.example.com: timeout (timed out during connect)
    Checking user@example.com with mx2.example.com
    mx2.example.com: accept (accepted)
    ");
}

#[test]
fn without_debug_sink_is_silent() {
    let resolver = Arc::new(example_mx());
    let prober = StubProber::new(accept);
    let (lines, sink) = capture();
    let v = validator(mx_config(), &resolver, &prober)
        .with_debug_sink(sink)
        .without_debug_sink();

    v.validate("user@example.com").unwrap();
    assert!(lines.lock().expect("lines lock").is_empty());
}

#[test]
fn free_function_uses_default_config() {
    set_default_config(ValidatorConfig::default());
    assert_eq!(default_config(), ValidatorConfig::default());
    assert!(validate("user@example.com").unwrap());
    assert!(!validate("user@").unwrap());
}
