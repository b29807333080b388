//! The per-run graph context
//!
//! A [`GraphSession`] owns both registries, the resolution cache and the
//! reverse index. It is created at the start of a run, filled by discovery
//! and the ldconfig preload, linked by the builder, numbered, serialized and
//! finally consulted by the command interpreter. Nothing survives the run.

use std::collections::HashMap;
use std::path::Path;

use log::warn;

use super::entry::{CatalogEntry, DigestState, EntryRef};
use super::numbering::{self, ReverseIndex};
use crate::digest::Digester;
use crate::domain::{EntryId, GraphError, Pid, Registry};

#[derive(Debug, Default)]
pub struct GraphSession {
    processes: Vec<CatalogEntry>,
    libraries: Vec<CatalogEntry>,
    /// Resolution cache: keys are unique across both registries
    cache: HashMap<String, EntryRef>,
    reverse: ReverseIndex,
    processes_numbered: bool,
    libraries_numbered: bool,
}

impl GraphSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entry under `key`.
    ///
    /// First write wins: if `key` is already known, in either registry,
    /// nothing is changed and `false` is returned.
    pub fn register(&mut self, registry: Registry, key: &str, path: &str) -> bool {
        self.insert(registry, key, CatalogEntry::new(path)).is_some()
    }

    /// Register a running executable, keyed by its resolved path.
    pub fn register_process(&mut self, path: &str, pid: Pid) -> bool {
        let mut entry = CatalogEntry::new(path);
        entry.pid = Some(pid);
        self.insert(Registry::Process, path, entry).is_some()
    }

    /// Register a shared library under a name or path key.
    pub fn register_library(&mut self, key: &str, path: &str) -> bool {
        self.register(Registry::Library, key, path)
    }

    fn insert(&mut self, registry: Registry, key: &str, entry: CatalogEntry) -> Option<EntryRef> {
        if self.cache.contains_key(key) {
            return None;
        }
        let list = self.registry_mut(registry);
        list.push(entry);
        let at = EntryRef { registry, index: list.len() - 1 };
        self.cache.insert(key.to_string(), at);
        Some(at)
    }

    /// Resolve a key registered earlier in this run
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<EntryRef> {
        self.cache.get(key).copied()
    }

    #[must_use]
    pub fn processes(&self) -> &[CatalogEntry] {
        &self.processes
    }

    #[must_use]
    pub fn libraries(&self) -> &[CatalogEntry] {
        &self.libraries
    }

    /// # Panics
    /// Panics if `at` does not come from this session.
    #[must_use]
    pub fn entry(&self, at: EntryRef) -> &CatalogEntry {
        match at.registry {
            Registry::Process => &self.processes[at.index],
            Registry::Library => &self.libraries[at.index],
        }
    }

    pub(crate) fn entry_mut(&mut self, at: EntryRef) -> &mut CatalogEntry {
        match at.registry {
            Registry::Process => &mut self.processes[at.index],
            Registry::Library => &mut self.libraries[at.index],
        }
    }

    fn registry_mut(&mut self, registry: Registry) -> &mut Vec<CatalogEntry> {
        match registry {
            Registry::Process => &mut self.processes,
            Registry::Library => &mut self.libraries,
        }
    }

    /// Hash the entry unless that was already attempted.
    ///
    /// Returns true if the entry has a digest afterwards. A failed hash is
    /// logged and leaves the digest empty for the rest of the run.
    pub fn ensure_digest<D: Digester + ?Sized>(&mut self, at: EntryRef, digester: &D) -> bool {
        let entry = self.entry_mut(at);
        if entry.digest.is_pending() {
            entry.digest = match digester.digest(Path::new(&entry.path)) {
                Ok(digest) => DigestState::Computed(digest),
                Err(e) => {
                    warn!("{e}");
                    DigestState::Failed
                }
            };
        }
        entry.digest.value().is_some()
    }

    /// Number one registry starting at `start` and return the next free id.
    ///
    /// Call once for processes and once for libraries with the value the
    /// first call returned; [`GraphSession::number_all`] does both.
    ///
    /// # Errors
    /// - [`GraphError::AlreadyNumbered`] if this registry was numbered before
    /// - [`GraphError::IdSpaceExhausted`] if the ids do not fit
    pub fn number(&mut self, registry: Registry, start: EntryId) -> Result<EntryId, GraphError> {
        let (entries, numbered) = match registry {
            Registry::Process => (&mut self.processes, &mut self.processes_numbered),
            Registry::Library => (&mut self.libraries, &mut self.libraries_numbered),
        };
        if *numbered {
            return Err(GraphError::AlreadyNumbered(registry));
        }
        let next = numbering::number(entries, registry, start, &mut self.reverse)?;
        *numbered = true;
        Ok(next)
    }

    /// Number processes from `base`, then libraries from where they stopped.
    ///
    /// # Errors
    /// See [`GraphSession::number`].
    pub fn number_all(&mut self, base: EntryId) -> Result<EntryId, GraphError> {
        let next = self.number(Registry::Process, base)?;
        self.number(Registry::Library, next)
    }

    #[must_use]
    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Look up an entry by the id it was given during numbering
    #[must_use]
    pub fn resolve_id(&self, id: EntryId) -> Option<&CatalogEntry> {
        self.reverse.get(id).map(|at| self.entry(at))
    }
}
