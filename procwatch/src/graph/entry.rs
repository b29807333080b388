//! Catalog entries shared by the process registry and the library catalog

use crate::domain::{EntryId, Pid, Registry};

/// Position of an entry inside one of the two registries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryRef {
    pub registry: Registry,
    pub index: usize,
}

impl EntryRef {
    #[must_use]
    pub fn process(index: usize) -> Self {
        Self { registry: Registry::Process, index }
    }

    #[must_use]
    pub fn library(index: usize) -> Self {
        Self { registry: Registry::Library, index }
    }
}

/// Fingerprint state of an entry
///
/// Hashing is attempted at most once per entry: a computed digest is never
/// recomputed and a failed one is not retried within the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DigestState {
    #[default]
    Pending,
    Computed(String),
    Failed,
}

impl DigestState {
    /// The hex digest, if one was computed
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            DigestState::Computed(digest) => Some(digest),
            DigestState::Pending | DigestState::Failed => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, DigestState::Pending)
    }
}

/// A process or library record
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Absolute path of the executable or library
    pub path: String,
    pub digest: DigestState,
    /// Assigned during numbering
    pub id: Option<EntryId>,
    /// Set for process entries only
    pub pid: Option<Pid>,
    /// Indices into the library catalog, in first-seen order, no duplicates.
    /// Always empty for library entries.
    pub deps: Vec<usize>,
    /// Declared dependency names that did not resolve to a library
    pub unresolved: usize,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: DigestState::Pending,
            id: None,
            pid: None,
            deps: Vec::new(),
            unresolved: 0,
        }
    }

    /// Add an edge to library `index`; returns false if it was already present
    pub fn link(&mut self, index: usize) -> bool {
        if self.deps.contains(&index) {
            return false;
        }
        self.deps.push(index);
        true
    }
}
