//! Per-table writer cache and the commit-list accumulator.

use hashbrown::HashMap;

use crate::engine::TableWriter;

/// Lifecycle state of a [`CacheEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Not yet resolved against the storage engine.
    Initial,
    /// Confirmed to exist; a writer may be cached.
    Exists,
    /// Permanently unusable for the life of the cache — the engine could
    /// not report a definite status. Never downgraded back to `Initial`.
    Unusable,
}

/// Per-table cached state: a possibly-absent writer and its lifecycle
/// state.
#[derive(Debug)]
pub struct CacheEntry {
    /// The cached writer, once acquired.
    pub writer: Option<Box<dyn TableWriter>>,
    /// This entry's lifecycle state.
    pub state: EntryState,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            writer: None,
            state: EntryState::Initial,
        }
    }
}

/// A resolved location in the [`WriterCache`], distinguishing a slot that
/// already holds an entry from one that does not yet.
///
/// Replaces the negative/non-negative integer convention of the system
/// this crate's behavior is modeled on with a typed enum: the "same table
/// as last line" fast path becomes an equality check on `Handle` rather
/// than a signed-integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// An entry already exists for this table name.
    Present(usize),
    /// No entry exists yet; the index is where one would be inserted.
    Absent(usize),
}

/// Content-addressed cache of per-table writer state, keyed by table name.
///
/// Slots are indices into an internal `Vec`, addressed by table name
/// through a `HashMap` so repeated lookups of the same name are O(1)
/// without rehashing on every event.
#[derive(Debug, Default)]
pub struct WriterCache {
    slots: Vec<CacheEntry>,
    by_name: HashMap<Box<str>, usize>,
}

impl WriterCache {
    /// Construct an empty cache.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Resolve `name` to a [`Handle`], without creating an entry.
    pub fn lookup(&self, name: &str) -> Handle {
        match self.by_name.get(name) {
            Some(&idx) => Handle::Present(idx),
            None => Handle::Absent(self.slots.len()),
        }
    }

    /// Insert a fresh [`CacheEntry`] for `name` at the slot a prior
    /// [`Handle::Absent`] lookup predicted, returning its index.
    ///
    /// # Panics
    ///
    /// Panics if `name` already has an entry.
    pub fn insert(&mut self, name: &str) -> usize {
        assert!(
            !self.by_name.contains_key(name),
            "cache entry already exists for '{name}'"
        );
        let idx = self.slots.len();
        self.slots.push(CacheEntry::new());
        self.by_name.insert(name.into(), idx);
        idx
    }

    /// Borrow the entry at `idx`.
    pub fn entry(&self, idx: usize) -> &CacheEntry {
        &self.slots[idx]
    }

    /// Mutably borrow the entry at `idx`.
    pub fn entry_mut(&mut self, idx: usize) -> &mut CacheEntry {
        &mut self.slots[idx]
    }

    /// The table name stored at `idx`.
    pub fn name_at(&self, idx: usize) -> &str {
        self.by_name
            .iter()
            .find(|(_, &v)| v == idx)
            .map(|(k, _)| k.as_ref())
            .expect("slot index must have a corresponding name")
    }

    /// Release every cached writer, retaining entry state.
    pub fn release_all(&mut self) {
        for entry in &mut self.slots {
            entry.writer = None;
        }
    }
}

/// Tracks table names whose writers have accepted rows since the last
/// commit.
///
/// Holds names rather than writer handles: writers are exclusively owned
/// by [`WriterCache`], so a second collection of borrowed/cloned handles
/// would alias ownership. A name is looked back up through the cache at
/// commit time.
#[derive(Debug, Default)]
pub struct CommitList {
    dirty: Vec<Box<str>>,
}

impl CommitList {
    /// Construct an empty commit list.
    pub fn new() -> Self {
        Self { dirty: Vec::new() }
    }

    /// Mark `name` dirty, unless it is already present.
    pub fn mark_dirty(&mut self, name: &str) {
        if !self.dirty.iter().any(|n| n.as_ref() == name) {
            self.dirty.push(name.into());
        }
    }

    /// Remove `name` from the dirty set, if present.
    ///
    /// Called when a table becomes the active entry again: it will be
    /// committed through the active-writer branch of `commit_all`, so it
    /// must not also remain on the dirty list — `commit_all` would
    /// otherwise call `TableWriter::commit` on it twice.
    pub fn mark_clean(&mut self, name: &str) {
        self.dirty.retain(|n| n.as_ref() != name);
    }

    /// The table names currently marked dirty.
    pub fn names(&self) -> &[Box<str>] {
        &self.dirty
    }

    /// Clear the dirty set.
    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reflects_presence() {
        let mut cache = WriterCache::new();
        assert_eq!(cache.lookup("cpu"), Handle::Absent(0));
        let idx = cache.insert("cpu");
        assert_eq!(cache.lookup("cpu"), Handle::Present(idx));
    }

    #[test]
    fn commit_list_dedups() {
        let mut list = CommitList::new();
        list.mark_dirty("cpu");
        list.mark_dirty("cpu");
        list.mark_dirty("mem");
        assert_eq!(list.names().len(), 2);
    }

    #[test]
    fn mark_clean_removes_reactivated_name() {
        let mut list = CommitList::new();
        list.mark_dirty("cpu");
        list.mark_dirty("mem");
        list.mark_clean("cpu");
        assert_eq!(list.names(), &[Box::<str>::from("mem")]);
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn insert_twice_panics() {
        let mut cache = WriterCache::new();
        cache.insert("cpu");
        cache.insert("cpu");
    }
}
