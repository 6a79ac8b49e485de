//! surmise - print the registrable domains named by proxy rules
//!
//! Reads rules (one per line) from files or stdin and prints each distinct
//! registrable domain once.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use genpac_util::{
    conv_list, read_file, write_file, DomainResolver, PublicSuffixList, ResolverOptions,
    SuffixOptions,
};

/// Surmise registrable domains from proxy rules
#[derive(Parser, Debug)]
#[command(name = "surmise")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rule files to read (stdin when omitted)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Public suffix list file (defaults to the bundled snapshot)
    #[arg(long, value_name = "PATH")]
    suffix_list: Option<PathBuf>,

    /// Also recognize privately registered suffixes
    #[arg(long)]
    include_private: bool,

    /// Treat names under unknown TLDs as registrable
    #[arg(long)]
    accept_unknown: bool,

    /// Sort output instead of keeping first-seen order
    #[arg(long)]
    sort: bool,

    /// Write domains to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(verbose >= 2))
        .init();
}

fn read_rules(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut text = String::new();
    if files.is_empty() {
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read rules from stdin")?;
    } else {
        for path in files {
            text.push_str(&read_file(path)?);
            text.push('\n');
        }
    }
    // Rules may contain commas (e.g. query strings), split on lines only
    Ok(conv_list(&serde_json::Value::String(text), "\n"))
}

fn run(args: Args) -> Result<()> {
    let options = SuffixOptions::new()
        .with_only_icann(!args.include_private)
        .with_accept_unknown(args.accept_unknown);
    let list = match &args.suffix_list {
        Some(path) => PublicSuffixList::from_file(path, options)?,
        None => PublicSuffixList::bundled(options)?,
    };
    let resolver = DomainResolver::with_options(list, ResolverOptions::default());

    let rules = read_rules(&args.files)?;
    debug!(rules = rules.len(), "read rules");

    let mut domains: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for rule in &rules {
        let domain = resolver.resolve(rule);
        if domain.is_empty() {
            debug!(rule = %rule, "no domain");
            continue;
        }
        if seen.insert(domain.clone()) {
            domains.push(domain);
        }
    }
    if args.sort {
        domains.sort();
    }
    debug!(domains = domains.len(), "surmised domains");

    let mut out = domains.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    match &args.output {
        Some(path) => write_file(path, out)?,
        None => print!("{}", out),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = run(args);
    if let Err(ref e) = result {
        error!("{:#}", e);
    }
    result
}
