//! knit-lint - validate and compare Knitfab API values and request documents.

mod config;
mod document;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use knit_api_types::{Annotation, Tag};
use tracing::{debug, info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use config::{Config, Format};
use document::{Document, Kind};

/// knit-lint - Knitfab API document checker
#[derive(Parser)]
#[command(name = "knit-lint")]
#[command(about = "Validate and compare Knitfab API values", long_about = None)]
struct Cli {
    /// Input encoding of documents
    #[arg(short, long, value_enum, default_value_t = Format::Auto, global = true)]
    format: Format,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse tags written as KEY:VALUE
    Tag {
        /// Tag expressions
        #[arg(required = true)]
        exprs: Vec<String>,
    },

    /// Parse annotations written as KEY=VALUE
    Annotation {
        /// Annotation expressions
        #[arg(required = true)]
        exprs: Vec<String>,
    },

    /// Validate a request document and print its canonical JSON
    Check {
        #[arg(value_enum)]
        kind: Kind,

        /// Document path
        file: PathBuf,
    },

    /// Compare two request documents of the same kind
    Diff {
        #[arg(value_enum)]
        kind: Kind,

        /// First document path
        a: PathBuf,

        /// Second document path
        b: PathBuf,
    },
}

/// Result of a command that ran to completion.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Ok,
    Differs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config {
        format: cli.format,
        pretty: cli.pretty,
        ..Config::default()
    };

    let directive = match config.log_directive.parse::<Directive>() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("error: bad log directive {:?}: {e}", config.log_directive);
            return ExitCode::from(2);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config) {
        Ok(Outcome::Ok) => ExitCode::SUCCESS,
        Ok(Outcome::Differs) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands, config: &Config) -> Result<Outcome> {
    match command {
        Commands::Tag { exprs } => {
            for line in describe_tags(&exprs)? {
                println!("{line}");
            }
            Ok(Outcome::Ok)
        }
        Commands::Annotation { exprs } => {
            for line in describe_annotations(&exprs)? {
                println!("{line}");
            }
            Ok(Outcome::Ok)
        }
        Commands::Check { kind, file } => {
            let doc = load(kind, &file, config)?;
            println!("{}", doc.to_json(config.pretty)?);
            info!(kind = ?doc.kind(), path = %file.display(), "document is valid");
            Ok(Outcome::Ok)
        }
        Commands::Diff { kind, a, b } => {
            let left = load(kind, &a, config)?;
            let right = load(kind, &b, config)?;
            if left == right {
                println!("equal");
                Ok(Outcome::Ok)
            } else {
                println!("{}", left.to_json(config.pretty)?);
                println!("{}", right.to_json(config.pretty)?);
                warn!(a = %a.display(), b = %b.display(), "documents differ");
                Ok(Outcome::Differs)
            }
        }
    }
}

/// One line per tag: canonical form, then `system` or `user`.
fn describe_tags(exprs: &[String]) -> Result<Vec<String>> {
    exprs
        .iter()
        .map(|expr| {
            let tag = Tag::parse(expr).with_context(|| format!("tag {expr:?}"))?;
            let owner = if tag.is_system() { "system" } else { "user" };
            debug!(key = tag.key(), value = tag.value(), "parsed tag");
            Ok(format!("{tag}\t{owner}"))
        })
        .collect()
}

fn describe_annotations(exprs: &[String]) -> Result<Vec<String>> {
    exprs
        .iter()
        .map(|expr| {
            let annotation =
                Annotation::parse(expr).with_context(|| format!("annotation {expr:?}"))?;
            Ok(annotation.to_string())
        })
        .collect()
}

fn load(kind: Kind, path: &Path, config: &Config) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let format = config.format.resolve(path);
    debug!(path = %path.display(), ?format, "decoding document");
    Document::decode(kind, format, &text)
        .with_context(|| format!("failed to decode {}", path.display()))
}
