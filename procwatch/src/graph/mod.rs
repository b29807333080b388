//! # Binary Dependency Graph
//!
//! A two-level graph: process entries point at the library entries they link
//! against. Libraries never point anywhere, so the graph is bipartite and
//! dependencies of dependencies are not expanded.
//!
//! ## Lifecycle of a run
//!
//! ```text
//! ldconfig preload ──▶ library catalog ─┐
//!                                       ├──▶ GraphSession (resolution cache)
//! /proc discovery ──▶ process registry ─┘
//!                                       │
//!                                       ▼
//!                           build_graph: parse + link + hash
//!                                       │
//!                                       ▼
//!                 number_all: processes 1..P, libraries P+1..P+L
//!                                       │
//!                    ┌──────────────────┴──────────────────┐
//!                    ▼                                     ▼
//!              report export                      reverse index (id → entry)
//!                                                          │
//!                                                          ▼
//!                                              kill directive execution
//! ```
//!
//! ## Module Structure
//!
//! - **`entry`**: catalog entries, digest state, registry positions
//! - **`session`**: the run context with both registries and the resolution cache
//! - **`builder`**: walks the process registry and records edges
//! - **`numbering`**: contiguous id assignment and the reverse index

pub mod builder;
pub mod entry;
pub mod numbering;
pub mod session;

pub use builder::{build_graph, build_graph_with, BuildSummary, ParseFailure};
pub use entry::{CatalogEntry, DigestState, EntryRef};
pub use numbering::ReverseIndex;
pub use session::GraphSession;
