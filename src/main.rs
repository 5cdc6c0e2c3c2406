//! docsan CLI
//!
//! Cleans an HTML document read from a file or stdin.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use docsan::config::restricted::RESTRICTED_CONFIG;
use docsan::sanitizer::read_source;
use docsan::{Error, Result, Sanitizer, Stage, DEFAULT_CONFIG};

/// docsan - normalize and sanitize HTML documents
#[derive(Parser)]
#[command(name = "docsan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTML file to clean, stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only run these stages (anchors, elements, references, nested-tables, tables, cells)
    #[arg(short, long = "stage")]
    stages: Vec<Stage>,

    /// Use the restricted policy (no images, web links only)
    #[arg(long)]
    restricted: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = if cli.restricted {
        &*RESTRICTED_CONFIG
    } else {
        &*DEFAULT_CONFIG
    };
    let sanitizer = Sanitizer::new(config);

    let input = match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => read_source(path)?,
        _ => read_stdin()?,
    };

    let stages = if cli.stages.is_empty() {
        Stage::ALL.to_vec()
    } else {
        cli.stages
    };
    let html = sanitizer.clean_stages(&input, &stages)?;

    match cli.output {
        Some(path) => fs::write(&path, html).map_err(|err| Error::io(path, err)),
        None => io::stdout()
            .write_all(html.as_bytes())
            .map_err(|err| Error::io("<stdout>", err)),
    }
}

fn read_stdin() -> Result<String> {
    let mut bytes = vec![];
    io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io("<stdin>", err))?;
    String::from_utf8(bytes).map_err(|err| Error::parse(format!("stdin is not valid UTF-8: {}", err)))
}
