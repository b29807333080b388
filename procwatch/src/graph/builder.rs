//! Process → library dependency graph construction
//!
//! Processes are visited in registry order, one at a time: hash the
//! executable, parse its image, register its interpreter, then resolve each
//! declared dependency against the resolution cache. A library is hashed the
//! first time any process links against it, so shared libraries are hashed
//! once no matter how many processes use them.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::entry::EntryRef;
use super::session::GraphSession;
use crate::digest::Digester;
use crate::domain::{ElfError, Registry};
use crate::elf::{parse_image, ElfImage};

/// A process whose image could not be inspected
#[derive(Debug)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub error: ElfError,
}

/// Outcome of one pass over the process registry
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Processes whose image parsed cleanly
    pub parsed: usize,
    pub failures: Vec<ParseFailure>,
    /// Dependency edges recorded
    pub edges: usize,
    /// Dependency names that matched no library
    pub unresolved: usize,
    /// Interpreters first seen while parsing and added to the catalog
    pub interpreters: usize,
}

impl BuildSummary {
    /// True if at least one process image was parsed.
    ///
    /// A single bad binary does not fail the scan; a scan where nothing at
    /// all could be read does.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.parsed > 0
    }
}

/// Link every registered process to the libraries it declares.
pub fn build_graph<D: Digester + ?Sized>(session: &mut GraphSession, digester: &D) -> BuildSummary {
    build_graph_with(session, digester, parse_image)
}

/// [`build_graph`] with the image parser supplied by the caller
pub fn build_graph_with<D, P>(session: &mut GraphSession, digester: &D, mut parse: P) -> BuildSummary
where
    D: Digester + ?Sized,
    P: FnMut(&Path) -> Result<ElfImage, ElfError>,
{
    let mut summary = BuildSummary::default();

    for index in 0..session.processes().len() {
        let process = EntryRef::process(index);
        session.ensure_digest(process, digester);

        let path = PathBuf::from(&session.entry(process).path);
        let image = match parse(&path) {
            Ok(image) => image,
            Err(error) => {
                warn!("Skipping {}: {error}", path.display());
                summary.failures.push(ParseFailure { path, error });
                continue;
            }
        };
        summary.parsed += 1;

        if let Some(interpreter) = &image.interpreter {
            if session.register_library(interpreter, interpreter) {
                debug!("Registered interpreter {interpreter}");
                summary.interpreters += 1;
            }
        }

        for name in &image.needed {
            match session.lookup(name) {
                Some(EntryRef { registry: Registry::Library, index: library }) => {
                    if session.entry_mut(process).link(library) {
                        summary.edges += 1;
                    }
                    session.ensure_digest(EntryRef::library(library), digester);
                }
                // Keys are shared with the process registry; a hit there is
                // not a library and must not become an edge.
                Some(EntryRef { registry: Registry::Process, .. }) | None => {
                    debug!("{}: unresolved dependency {name}", path.display());
                    session.entry_mut(process).unresolved += 1;
                    summary.unresolved += 1;
                }
            }
        }
    }

    info!(
        "Dependency graph: {} parsed, {} failed, {} edges, {} unresolved",
        summary.parsed,
        summary.failures.len(),
        summary.edges,
        summary.unresolved
    );

    summary
}
