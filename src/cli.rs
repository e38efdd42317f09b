//! CLI interface for ccviz
//!
//! The binary turns one or more usage report files (and/or standard input)
//! into a sharable dashboard URL:
//!
//! ```bash
//! # Share one report
//! ccviz usage.json
//!
//! # Merge two labeled machines, print the URL without opening a browser
//! ccviz laptop.json desktop.json --label laptop --label desktop --no-open
//!
//! # Pipe a report in
//! ccusage daily --json | ccviz --stdin-label work
//! ```

use crate::error::Result;
use crate::types::SourceInput;
use clap::Parser;
use std::path::PathBuf;

/// Build a sharable URL from usage report JSON
#[derive(Parser, Debug, Clone)]
#[command(name = "ccviz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Report files to share; standard input is read when piped or when no
    /// files are given
    pub files: Vec<PathBuf>,

    /// Base URL of the dashboard the fragment is appended to
    #[arg(long, default_value = "https://ccviz.app")]
    pub url: String,

    /// Label for a file input, applied in file order (repeatable)
    #[arg(long)]
    pub label: Vec<String>,

    /// Label for the standard-input source
    #[arg(long)]
    pub stdin_label: Option<String>,

    /// Print the URL instead of opening it in a browser
    #[arg(long)]
    pub no_open: bool,

    /// Show debug output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Whether standard input participates as a source
///
/// Stdin is read to EOF when no files were given, and whenever input is
/// piped in alongside files.
pub fn should_read_stdin(has_files: bool, stdin_is_tty: bool) -> bool {
    !has_files || !stdin_is_tty
}

/// Read file arguments into labeled inputs
///
/// Labels attach in file order; files beyond the label list stay unlabeled.
pub fn collect_file_inputs(files: &[PathBuf], labels: &[String]) -> Result<Vec<SourceInput>> {
    files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let text = std::fs::read_to_string(path)?;
            Ok(SourceInput {
                label: labels.get(i).cloned().unwrap_or_default(),
                text,
            })
        })
        .collect()
}
