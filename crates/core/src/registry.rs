//! Path registry: single source of truth for tracked tree state

use crate::entry::Entry;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Mapping from absolute path to [`Entry`], plus the lexicographic key order
///
/// Entries are never removed. The sorted key list is rebuilt only when the
/// key set grows, since counter updates cannot change the order.
#[derive(Debug, Default)]
pub struct PathRegistry {
    entries: AHashMap<PathBuf, Entry>,
    sorted: Vec<PathBuf>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an initial scan
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut registry = Self::new();
        registry.insert_many(entries);
        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Entry> {
        self.entries.get_mut(path)
    }

    /// Keys in byte-wise lexicographic order
    pub fn sorted_paths(&self) -> &[PathBuf] {
        &self.sorted
    }

    /// Insert a new entry; an existing key is left untouched
    ///
    /// Returns true if the key was new.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.insert_unsorted(entry) {
            self.resort();
            true
        } else {
            false
        }
    }

    /// Insert several entries with a single re-sort
    ///
    /// Returns how many keys were new.
    pub fn insert_many(&mut self, entries: impl IntoIterator<Item = Entry>) -> usize {
        let mut inserted = 0;
        for entry in entries {
            if self.insert_unsorted(entry) {
                inserted += 1;
            }
        }

        if inserted > 0 {
            self.resort();
        }
        inserted
    }

    /// Flag every strict descendant of `dir` as deleted and stamp it with `now`
    ///
    /// Scans the whole registry; cost grows with tree size. Returns the
    /// number of descendants touched.
    pub fn cascade_delete(&mut self, dir: &Path, now: Instant) -> usize {
        let mut touched = 0;
        for (path, entry) in self.entries.iter_mut() {
            if path != dir && path.starts_with(dir) {
                entry.deleted = true;
                entry.touch(now);
                touched += 1;
            }
        }
        touched
    }

    /// Iterate entries in sorted order
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Entry> {
        self.sorted.iter().filter_map(|path| self.entries.get(path))
    }

    fn insert_unsorted(&mut self, entry: Entry) -> bool {
        if self.entries.contains_key(&entry.path) {
            return false;
        }
        self.sorted.push(entry.path.clone());
        self.entries.insert(entry.path.clone(), entry);
        true
    }

    fn resort(&mut self) {
        self.sorted
            .sort_unstable_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    }
}
