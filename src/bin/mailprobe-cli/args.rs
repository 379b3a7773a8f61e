use std::time::Duration;

use clap::{Parser, Subcommand};
use mailprobe_lib::ValidatorConfig;

#[derive(Parser)]
#[command(name = "mailprobe-cli", about = "Validate e-mail addresses")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// read addresses from stdin (one per line)
    #[arg(long)]
    pub stdin: bool,

    /// write the report to a file (json/ndjson/csv)
    #[arg(long)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// require MX or A records for the domain
    #[arg(long)]
    pub check_dns: bool,

    /// probe the domain's mail exchangers over SMTP (implies --check-dns)
    #[arg(long)]
    pub check_mx: bool,

    /// envelope sender for probes (default: null sender)
    #[arg(long = "from")]
    pub sender: Option<String>,

    /// HELO identity
    #[arg(long)]
    pub helo: Option<String>,

    /// do not fall back to the local host name for HELO
    #[arg(long)]
    pub no_guess_helo: bool,

    /// per-host SMTP timeout, in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,

    /// SMTP port
    #[arg(long, default_value_t = mailprobe_lib::smtp::DEFAULT_PORT)]
    pub port: u16,

    /// print progress lines to stderr
    #[arg(long)]
    pub debug: bool,

    /// tracing filter, e.g. `mailprobe=debug` (falls back to RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    Validate { email: String },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn config(&self) -> ValidatorConfig {
        let mut config = ValidatorConfig::default()
            .check_dns(self.check_dns)
            .check_mx(self.check_mx)
            .guess_helo(!self.no_guess_helo)
            .timeout(Duration::from_secs(self.timeout))
            .port(self.port);
        if let Some(sender) = &self.sender {
            config = config.sender_address(sender.as_str());
        }
        if let Some(helo) = &self.helo {
            config = config.helo_domain(helo.as_str());
        }
        config
    }
}
