//! Identity numbering and the reverse id index
//!
//! Ids are handed out from a single counter: processes first, then
//! libraries, so the two registries share one contiguous id space. The
//! reverse index is what lets a kill directive received after the upload
//! address the entries numbered before it.

use std::collections::HashMap;

use super::entry::{CatalogEntry, EntryRef};
use crate::domain::{EntryId, GraphError, Registry};

/// Map from assigned id back to the entry that carries it
#[derive(Debug, Default)]
pub struct ReverseIndex {
    entries: HashMap<EntryId, EntryRef>,
}

impl ReverseIndex {
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<EntryRef> {
        self.entries.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assign `start, start+1, ...` to `entries` in order, recording each id in
/// `index`, and return the next free id.
///
/// # Errors
/// Returns [`GraphError::IdSpaceExhausted`] if the ids would not fit in `u32`;
/// nothing is assigned in that case.
pub fn number(
    entries: &mut [CatalogEntry],
    registry: Registry,
    start: EntryId,
    index: &mut ReverseIndex,
) -> Result<EntryId, GraphError> {
    let count = u32::try_from(entries.len()).map_err(|_| GraphError::IdSpaceExhausted)?;
    let next = start.0.checked_add(count).ok_or(GraphError::IdSpaceExhausted)?;

    for (position, (entry, id)) in entries.iter_mut().zip(start.0..next).enumerate() {
        let id = EntryId(id);
        entry.id = Some(id);
        index.entries.insert(id, EntryRef { registry, index: position });
    }

    Ok(EntryId(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<CatalogEntry> {
        paths.iter().map(|p| CatalogEntry::new(*p)).collect()
    }

    #[test]
    fn test_numbering_is_contiguous_across_calls() {
        let mut procs = entries(&["/bin/a", "/bin/b"]);
        let mut libs = entries(&["/lib/x.so", "/lib/y.so", "/lib/z.so"]);
        let mut index = ReverseIndex::default();

        let next = number(&mut procs, Registry::Process, EntryId(1), &mut index).unwrap();
        assert_eq!(next, EntryId(3));
        let end = number(&mut libs, Registry::Library, next, &mut index).unwrap();
        assert_eq!(end, EntryId(6));

        assert_eq!(procs[1].id, Some(EntryId(2)));
        assert_eq!(libs[0].id, Some(EntryId(3)));
        assert_eq!(index.len(), 5);
        assert_eq!(index.get(EntryId(5)), Some(EntryRef::library(2)));
        assert_eq!(index.get(EntryId(1)), Some(EntryRef::process(0)));
        assert_eq!(index.get(EntryId(6)), None);
    }

    #[test]
    fn test_empty_registry_returns_start() {
        let mut index = ReverseIndex::default();
        let next = number(&mut [], Registry::Library, EntryId(9), &mut index).unwrap();
        assert_eq!(next, EntryId(9));
        assert!(index.is_empty());
    }

    #[test]
    fn test_overflow_assigns_nothing() {
        let mut procs = entries(&["/bin/a", "/bin/b"]);
        let mut index = ReverseIndex::default();
        let result = number(&mut procs, Registry::Process, EntryId(u32::MAX - 1), &mut index);
        assert!(matches!(result, Err(GraphError::IdSpaceExhausted)));
        assert!(procs.iter().all(|e| e.id.is_none()));
        assert!(index.is_empty());
    }
}
