//! # procwatch - Process and Shared Library Fingerprinting Agent
//!
//! procwatch takes an inventory of what is executing on a Linux host. It lists
//! the running executables, reads each one's ELF image to find the shared
//! libraries it declares, fingerprints executables and libraries with SHA-256,
//! and uploads the resulting process → library graph to an inventory server.
//! The server may answer with a directive naming processes to terminate.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   /proc/*/   │   │  ldconfig -p │   │   Manifest   │
//! │     exe      │   │ linker cache │   │ key = value  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ processes        │ libraries        │ tenant, url, ...
//!        ▼                  ▼                  │
//! ┌─────────────────────────────────────┐      │
//! │            GraphSession             │      │
//! │  process registry │ library catalog │      │
//! │        resolution cache             │      │
//! └──────────────────┬──────────────────┘      │
//!                    │ build_graph             │
//!                    │  ├─ ELF parser (.interp, DT_NEEDED)
//!                    │  └─ SHA-256, once per entry
//!                    ▼                         │
//!              number_all (1..P, P+1..P+L)     │
//!                    │                         │
//!                    ▼                         ▼
//!              ┌─────────────────────────────────┐
//!              │  Report (JSON) ──▶ upload POST  │
//!              └────────────────┬────────────────┘
//!                               │ [ok, payload]
//!                               ▼
//!              kill_black_processes ──▶ reverse index ──▶ SIGKILL
//! ```
//!
//! ## Module Structure
//!
//! - [`elf`]: bounds-checked ELF64 parsing of untrusted executables
//! - [`graph`]: the per-run session, graph builder, and id numbering
//! - [`digest`]: SHA-256 content fingerprints
//! - [`discovery`]: `/proc` process listing and `ldconfig -p` preload
//! - [`export`]: report assembly
//! - [`transport`]: report upload over HTTP
//! - [`command`]: execution of the server's kill directive
//! - [`config`]: manifest loading
//! - [`cli`]: command-line arguments
//! - [`preflight`]: host checks before scanning
//! - [`domain`]: core types (`Pid`, `EntryId`, `Registry`) and errors
//!
//! ## Failure Model
//!
//! A binary that cannot be opened or parsed, or a file that cannot be
//! hashed, is logged and skipped: one bad executable never stops the scan.
//! The run fails only if the manifest or linker cache cannot be loaded, no
//! process could be parsed at all, or the report cannot be delivered.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Scan, upload and act on the server's reply
//! sudo procwatch /etc/procwatch/procwatch.conf
//!
//! # Inspect the report without uploading
//! sudo RUST_LOG=info procwatch --dry-run
//! ```

pub mod cli;
pub mod command;
pub mod config;
pub mod digest;
pub mod discovery;
pub mod domain;
pub mod elf;
pub mod export;
pub mod graph;
pub mod preflight;
pub mod transport;
