//! # procwatch - Main Entry Point
//!
//! One run = one snapshot: scan the host, upload the report, execute the
//! directive that comes back, exit.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::io;

use procwatch::cli::Args;
use procwatch::command::{execute_directive, SigKill};
use procwatch::config::Config;
use procwatch::digest::Sha256Digester;
use procwatch::discovery::{list_processes, load_ldconfig, register_libraries, register_processes};
use procwatch::domain::EntryId;
use procwatch::export::{Report, ReportMetadata};
use procwatch::graph::{build_graph, GraphSession};
use procwatch::preflight::run_preflight_checks;
use procwatch::transport::Uploader;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

/// First id handed out; processes come first, libraries continue the count
const FIRST_ENTRY_ID: EntryId = EntryId(1);

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else if msg.contains("missing required manifest key") || msg.contains("no 'url'") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    let config = Config::load(&args.config)?;
    run_preflight_checks(&args.proc_root, &config.ldconfig, quiet)?;

    if !quiet {
        eprintln!("procwatch v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("manifest: {}", args.config.display());
    }

    // ── Phase 1: build the graph ────────────────────────────────────────
    let mut session = GraphSession::new();

    let libraries = load_ldconfig(&config.ldconfig).context("Failed to load the linker cache")?;
    let added = register_libraries(&mut session, &libraries);
    info!("Library catalog seeded with {added} entries");

    let processes = list_processes(&args.proc_root)?;
    register_processes(&mut session, &processes);

    let summary = build_graph(&mut session, &Sha256Digester::new());
    if !summary.succeeded() {
        bail!(
            "No executable could be inspected ({} failures); nothing to report",
            summary.failures.len()
        );
    }

    session.number_all(FIRST_ENTRY_ID)?;

    let meta = ReportMetadata {
        tenant: config.tenant.clone(),
        domain: config.domain.clone(),
        hostname: config.resolve_hostname()?,
        publish: config.publish,
    };
    let report = Report::build(meta, &session)?;

    if !quiet {
        eprintln!(
            "scanned: {} executables ({} skipped), {} libraries linked, {} unresolved names",
            summary.parsed,
            summary.failures.len(),
            report.fingers.len() - session.processes().len(),
            summary.unresolved
        );
    }

    if args.dry_run {
        report.write_json(io::stdout().lock())?;
        return Ok(());
    }

    // ── Phase 2: upload and act on the reply ────────────────────────────
    let Some(url) = config.url.as_deref() else {
        bail!("No 'url' in manifest {}; use --dry-run to scan only", args.config.display());
    };
    let uploader = Uploader::new(url, config.timeout)?;
    let Some(response) = uploader.upload(&report).await? else {
        info!("Server returned no directive");
        return Ok(());
    };

    let outcome = execute_directive(&response, &session, &mut SigKill);
    if let Some(ref message) = outcome.server_error {
        eprintln!("server error: {message}");
    } else if !quiet && !outcome.signalled.is_empty() {
        eprintln!("killed: {} processes", outcome.signalled.len());
    }

    Ok(())
}
