//! cryptonl - list algorithms registered with the Linux kernel crypto API
//!
//! Dials the kernel's `NETLINK_CRYPTO` interface, dumps every registered
//! algorithm and prints its name, driver, module, priority and, for ciphers
//! and hashes, the sizes the kernel reports.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod formatter;

use cryptonl::{Algorithm, Conn};
use formatter::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional: only show algorithms whose name or driver name matches
    name: Option<String>,

    /// Output format
    #[arg(long, short = 'f', default_value = "plain")]
    format: String,

    /// Log debug information to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let output_format: OutputFormat = args.format.parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut conn = Conn::dial().context("failed to dial")?;
    let algorithms = conn.algorithms().context("failed to get algorithms");
    let closed = conn.close().context("failed to close");
    let algorithms = algorithms?;
    closed?;

    debug!(count = algorithms.len(), "listed algorithms");

    display_algorithms(&algorithms, args.name.as_deref(), output_format)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn display_algorithms(algorithms: &[Algorithm], name: Option<&str>, output_format: OutputFormat) -> Result<()> {
    let mut formatter = create_formatter(output_format);
    let mut stdout = io::stdout().lock();

    let selected: Vec<_> = algorithms
        .iter()
        .filter(|a| name.is_none_or(|n| a.name == n || a.driver == n))
        .collect();

    if let Some(name) = name {
        if selected.is_empty() && output_format == OutputFormat::Plain {
            writeln!(stdout, "\nAlgorithm '{}' not found.", name)?;
            return Ok(());
        }
    }

    formatter.begin_document(&mut stdout)?;
    for alg in &selected {
        formatter.algorithm(&mut stdout, alg)?;
    }
    formatter.total(&mut stdout, selected.len())?;
    formatter.end_document(&mut stdout)?;

    stdout.flush()?;
    Ok(())
}
