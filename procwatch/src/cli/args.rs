//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(
    name = "procwatch",
    about = "Fingerprint running executables and their shared libraries",
    after_help = "\
EXAMPLES:
    sudo procwatch                               Scan, upload, act on the reply
    sudo procwatch /etc/procwatch/staging.conf   Use another manifest
    sudo procwatch --dry-run > report.json       Scan only, print the report"
)]
pub struct Args {
    /// Manifest file with `key = value` lines
    #[arg(value_name = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print the report to stdout instead of uploading it (no directives run)
    #[arg(long)]
    pub dry_run: bool,

    /// Root of the process filesystem
    #[arg(long, default_value = "/proc", hide = true)]
    pub proc_root: PathBuf,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
