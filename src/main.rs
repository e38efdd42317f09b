//! ccviz - Normalize, merge, and share Claude Code usage reports

use anyhow::Context;
use ccviz::cli::{Cli, collect_file_inputs, should_read_stdin};
use ccviz::codec::{build_hash, build_payload};
use ccviz::types::SourceInput;
use clap::Parser;
use is_terminal::IsTerminal;
use std::io::Read;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("ccviz=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ccviz=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(error) = run(&cli) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut inputs = collect_file_inputs(&cli.files, &cli.label)?;

    if should_read_stdin(!cli.files.is_empty(), std::io::stdin().is_terminal()) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        if !text.trim().is_empty() {
            inputs.push(SourceInput {
                label: cli.stdin_label.clone().unwrap_or_default(),
                text,
            });
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("no input received");
    }

    let payload = build_payload(&inputs).context("failed to build payload")?;
    let hash = build_hash(&payload)?;
    let url = format!("{}{hash}", cli.url.trim_end_matches('/'));

    info!(sources = inputs.len(), "built share URL");
    println!("{url}");

    if !cli.no_open
        && let Err(error) = open::that(&url)
    {
        warn!("could not open browser: {error}");
    }

    Ok(())
}
