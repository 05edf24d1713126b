//! CLI entry point for `crmintake`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crmintake::config::Config;
use crmintake::error::ParseError;
use crmintake::intake::{self, IntakePolicy};
use crmintake::model::parsed::{ParseOutcome, ParsedMail};
use crmintake::model::payload::{read_input, InboundEmailPayload};
use crmintake::parser::{self, eml};

#[derive(Parser)]
#[command(
    name = "crmintake",
    version,
    about = "Classify inbound CRM email: BCC vs forwarded, contact, body and comment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one webhook payload (JSON, or `-` for stdin)
    Classify {
        path: PathBuf,
        /// Input is a raw RFC 5322 message instead of webhook JSON
        #[arg(long)]
        eml: bool,
    },
    /// Classify and run the intake checks
    Check {
        path: PathBuf,
        #[arg(long)]
        eml: bool,
    },
    /// List forwarded blocks found in a plain-text body
    Extract { path: PathBuf },
    /// Classify every .json / .eml file in a directory
    Batch {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = crmintake::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let pretty = config.output.pretty && !cli.compact;

    match cli.command {
        Commands::Classify { path, eml } => cmd_classify(&path, eml, pretty),
        Commands::Check { path, eml } => cmd_check(&path, eml, pretty, &config),
        Commands::Extract { path } => cmd_extract(&path, pretty),
        Commands::Batch { dir, json } => cmd_batch(&dir, json, pretty),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = crmintake::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "crmintake.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn load_payload(path: &Path, is_eml: bool) -> anyhow::Result<InboundEmailPayload> {
    let payload = if is_eml {
        eml::payload_from_eml_file(path)?
    } else {
        InboundEmailPayload::from_file(path)?
    };
    Ok(payload)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

/// Classify a payload and print the outcome, errors included.
fn cmd_classify(path: &Path, is_eml: bool, pretty: bool) -> anyhow::Result<()> {
    let payload = load_payload(path, is_eml)?;
    let outcome = ParseOutcome::from(parser::classify(&payload));
    print_json(&outcome, pretty)
}

/// Classify a payload and gate it; a rejection is a failing exit.
fn cmd_check(path: &Path, is_eml: bool, pretty: bool, config: &Config) -> anyhow::Result<()> {
    let payload = load_payload(path, is_eml)?;
    let policy = IntakePolicy::from_config(&config.intake);

    match intake::accept(parser::classify(&payload), &policy) {
        Ok(accepted) => print_json(&accepted, pretty),
        Err(rejection) => anyhow::bail!("Rejected: {rejection}"),
    }
}

/// Print the forwarded blocks of a plain-text body.
fn cmd_extract(path: &Path, pretty: bool) -> anyhow::Result<()> {
    let text = read_input(path)?;
    let messages = parser::extract_forwarded_messages(&text);
    if messages.is_empty() {
        eprintln!("  No forwarded messages found.");
    }
    print_json(&messages, pretty)
}

/// Classify every payload in a directory and summarize by mode.
fn cmd_batch(dir: &Path, json: bool, pretty: bool) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("json") | Some("eml")
            )
        })
        .collect();
    files.sort();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Classifying [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut results = Vec::with_capacity(files.len());

    for file in &files {
        let is_eml = file.extension().is_some_and(|e| e == "eml");
        let label = match load_payload(file, is_eml) {
            Ok(payload) => {
                let outcome = parser::classify(&payload);
                let label = outcome_label(&outcome);
                results.push(serde_json::json!({
                    "file": file.to_string_lossy(),
                    "outcome": ParseOutcome::from(outcome),
                }));
                label
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping unreadable payload");
                results.push(serde_json::json!({
                    "file": file.to_string_lossy(),
                    "invalid": e.to_string(),
                }));
                "INVALID"
            }
        };
        *totals.entry(label.to_string()).or_default() += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();

    if json {
        return print_json(
            &serde_json::json!({
                "file_count": files.len(),
                "totals": totals,
                "results": results,
            }),
            pretty,
        );
    }

    println!();
    println!("  {:<12} {}", "Files", files.len());
    for (label, count) in &totals {
        println!("  {label:<12} {count}");
    }
    println!();
    Ok(())
}

fn outcome_label(outcome: &Result<ParsedMail, ParseError>) -> &'static str {
    match outcome {
        Ok(mail) => mail.mode.as_str(),
        Err(_) => "ERROR",
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "crmintake", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
