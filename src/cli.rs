//! CLI argument parsing with clap.
//!
//! The orchestrator starts the program without arguments; these flags exist
//! for manual runs and for installations with a non-default layout.

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "ipset-responder")]
#[command(author, version, about = "Active response adding or removing a source IP from an ipset")]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug output on stderr)
    #[arg(short, long)]
    pub verbose: bool,
}
