#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use mailprobe_lib::Validator;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Cli, Commands};
use crate::output::OutputRow;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let mut validator = Validator::new(cli.config());
    if cli.debug {
        validator = validator.with_debug_sink(|line: &str| eprintln!("debug: {line}"));
    }

    let addresses: Vec<String> = if cli.stdin {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("read stdin")?
    } else if let Some(Commands::Validate { email }) = &cli.cmd {
        vec![email.clone()]
    } else {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    };

    let mut rows = Vec::with_capacity(addresses.len());
    for address in addresses {
        let verdict = validator
            .verdict(&address)
            .with_context(|| format!("validating {address:?}"))?;
        rows.push(OutputRow::new(address, verdict));
    }

    output::write_reports(&rows, &cli)?;

    // exit codes: 0 OK, 2 invalid, 1 fatal
    if output::any_invalid(&rows) {
        std::process::exit(2);
    }
    Ok(())
}

/// Installs a stderr subscriber when `--log` or `RUST_LOG` asks for one.
fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        },
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
