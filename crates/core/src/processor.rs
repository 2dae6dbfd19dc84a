//! Event processor: applies one notification at a time to the registry
//!
//! Filesystem access goes through [`WatchBackend`] so the state machine can
//! be driven without a real filesystem.

use crate::entry::{Entry, Notification, OpKinds};
use crate::error::{Error, Result};
use crate::policy::SkipPolicy;
use crate::registry::PathRegistry;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// A path found by a tree walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Discovered {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
        }
    }

    /// Untouched entry for the initial scan
    pub fn into_entry(self) -> Entry {
        Entry::new(self.path, self.is_dir)
    }
}

/// Filesystem and watch-registration seam used by [`EventProcessor`]
pub trait WatchBackend {
    /// Stat a path: `Ok(true)` for a directory, `Ok(false)` otherwise
    fn stat(&self, path: &Path) -> std::io::Result<bool>;

    /// Walk everything strictly below `root`, applying the skip policy
    ///
    /// Unreadable children are skipped silently.
    fn walk(&self, root: &Path) -> Vec<Discovered>;

    /// Register a single directory for notifications
    fn register(&mut self, dir: &Path) -> Result<()>;
}

/// Aggregate counters shown alongside the path list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// Non-atomic notifications processed
    pub total_events: u64,
    /// Atomic-save temp notifications dropped
    pub atomic_events: u64,
    /// Most recent non-fatal error
    pub last_error: Option<String>,
}

/// Classifies notifications and mutates the registry
#[derive(Debug)]
pub struct EventProcessor {
    policy: SkipPolicy,
    tally: Tally,
}

impl EventProcessor {
    pub fn new(policy: SkipPolicy) -> Self {
        Self {
            policy,
            tally: Tally::default(),
        }
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Replace the last error; only one is retained
    pub fn record_error(&mut self, err: impl Display) {
        self.tally.last_error = Some(err.to_string());
    }

    /// Apply one notification
    ///
    /// Returns false only when the notification was an atomic-save temp file
    /// and the registry was left untouched.
    pub fn process<B: WatchBackend>(
        &mut self,
        registry: &mut PathRegistry,
        backend: &mut B,
        notification: &Notification,
        now: Instant,
    ) -> bool {
        let path = notification.path.as_path();
        let kinds = notification.kinds;

        if self.policy.is_atomic_temp(path) {
            self.tally.atomic_events += 1;
            trace!("Atomic-save temp event: {}", path.display());
            return false;
        }
        self.tally.total_events += 1;

        if !registry.contains(path) {
            let is_dir = stat_is_dir(backend, path);
            registry.insert(Entry::new(path, is_dir));
        }

        let Some(entry) = registry.get_mut(path) else {
            return true;
        };
        entry.touch(now);
        let is_dir = entry.is_dir;

        if kinds.contains(OpKinds::CREATE) {
            entry.counts.create += 1;
            entry.deleted = false;
        }
        if kinds.contains(OpKinds::WRITE) {
            entry.counts.write += 1;
        }
        if kinds.contains(OpKinds::CHMOD) {
            entry.counts.chmod += 1;
        }
        if kinds.is_departure() {
            if kinds.contains(OpKinds::REMOVE) {
                entry.counts.remove += 1;
            }
            if kinds.contains(OpKinds::RENAME) {
                entry.counts.rename += 1;
            }
            entry.deleted = true;
        }

        if kinds.contains(OpKinds::CREATE) && is_dir {
            if self.policy.is_noise_dir(path) {
                debug!("Not descending into noise directory {}", path.display());
            } else {
                self.rediscover(registry, backend, path, now);
            }
        }
        if kinds.is_departure() && is_dir {
            let touched = registry.cascade_delete(path, now);
            debug!("Cascaded deletion of {} to {} descendants", path.display(), touched);
        }

        true
    }

    /// Watch a (re)created directory and pick up whatever now lives under it
    ///
    /// A move into the tree is usually reported as a single create for the
    /// directory, so its children are found by walking rather than by events.
    fn rediscover<B: WatchBackend>(
        &mut self,
        registry: &mut PathRegistry,
        backend: &mut B,
        dir: &Path,
        now: Instant,
    ) {
        self.register(backend, dir);

        let mut fresh = Vec::new();
        for found in backend.walk(dir) {
            if found.is_dir {
                self.register(backend, &found.path);
            }
            match registry.get_mut(&found.path) {
                Some(known) => {
                    if known.deleted {
                        known.deleted = false;
                        known.touch(now);
                    }
                }
                None => fresh.push(Entry::discovered(found.path, found.is_dir, now)),
            }
        }

        let inserted = registry.insert_many(fresh);
        if inserted > 0 {
            debug!("Rediscovered {} new paths under {}", inserted, dir.display());
        }
    }

    fn register<B: WatchBackend>(&mut self, backend: &mut B, dir: &Path) {
        if let Err(e) = backend.register(dir) {
            warn!("{}", e);
            self.record_error(e);
        }
    }
}

fn stat_is_dir<B: WatchBackend>(backend: &B, path: &Path) -> bool {
    match backend.stat(path) {
        Ok(is_dir) => is_dir,
        Err(source) => {
            let err = Error::Stat {
                path: path.to_path_buf(),
                source,
            };
            debug!("{}; treating as file", err);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::policy::SkipConfig;
    use std::collections::{BTreeMap, HashSet};
    use std::time::Duration;

    /// In-memory filesystem: path -> is_dir
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub files: BTreeMap<PathBuf, bool>,
        pub registered: Vec<PathBuf>,
        pub refuse: HashSet<PathBuf>,
    }

    impl FakeBackend {
        pub fn with(paths: &[(&str, bool)]) -> Self {
            Self {
                files: paths.iter().map(|(p, d)| (PathBuf::from(p), *d)).collect(),
                ..Self::default()
            }
        }
    }

    impl WatchBackend for FakeBackend {
        fn stat(&self, path: &Path) -> std::io::Result<bool> {
            self.files.get(path).copied().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
            })
        }

        fn walk(&self, root: &Path) -> Vec<Discovered> {
            self.files
                .iter()
                .filter(|(p, _)| p.as_path() != root && p.starts_with(root))
                .map(|(p, d)| Discovered::new(p.clone(), *d))
                .collect()
        }

        fn register(&mut self, dir: &Path) -> Result<()> {
            if self.refuse.contains(dir) {
                return Err(Error::WatchRegistration {
                    path: dir.to_path_buf(),
                    reason: "permission denied".to_string(),
                });
            }
            self.registered.push(dir.to_path_buf());
            Ok(())
        }
    }

    fn processor() -> EventProcessor {
        EventProcessor::new(SkipPolicy::new(&SkipConfig::default()).unwrap())
    }

    fn entry<'a>(registry: &'a PathRegistry, path: &str) -> &'a Entry {
        registry.get(Path::new(path)).unwrap()
    }

    #[test]
    fn test_create_remove_recreate_keeps_counters() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::with(&[("/root/a.txt", false)]);
        let mut proc = processor();
        let now = Instant::now();

        proc.process(&mut registry, &mut backend, &Notification::new("/root/a.txt", OpKinds::CREATE), now);
        let a = entry(&registry, "/root/a.txt");
        assert_eq!(a.counts.create, 1);
        assert!(!a.deleted);

        backend.files.clear();
        proc.process(&mut registry, &mut backend, &Notification::new("/root/a.txt", OpKinds::REMOVE), now);
        let a = entry(&registry, "/root/a.txt");
        assert_eq!(a.counts.remove, 1);
        assert_eq!(a.counts.create, 1);
        assert!(a.deleted);

        backend.files.insert(PathBuf::from("/root/a.txt"), false);
        proc.process(&mut registry, &mut backend, &Notification::new("/root/a.txt", OpKinds::CREATE), now);
        let a = entry(&registry, "/root/a.txt");
        assert_eq!(a.counts.create, 2);
        assert_eq!(a.counts.remove, 1);
        assert!(!a.deleted);

        assert_eq!(registry.len(), 1);
        assert_eq!(proc.tally().total_events, 3);
    }

    #[test]
    fn test_combined_kinds_all_counted() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::with(&[("/root/a.txt", false)]);
        let mut proc = processor();

        let kinds = OpKinds::CREATE | OpKinds::WRITE | OpKinds::CHMOD;
        proc.process(&mut registry, &mut backend, &Notification::new("/root/a.txt", kinds), Instant::now());

        let a = entry(&registry, "/root/a.txt");
        assert_eq!(a.counts.create, 1);
        assert_eq!(a.counts.write, 1);
        assert_eq!(a.counts.chmod, 1);
        assert_eq!(a.counts.remove, 0);
        assert_eq!(proc.tally().total_events, 1);
    }

    #[test]
    fn test_remove_and_rename_in_one_notification() {
        let mut registry = PathRegistry::from_entries([Entry::new("/root/a.txt", false)]);
        let mut backend = FakeBackend::default();
        let mut proc = processor();

        let kinds = OpKinds::REMOVE | OpKinds::RENAME;
        proc.process(&mut registry, &mut backend, &Notification::new("/root/a.txt", kinds), Instant::now());

        let a = entry(&registry, "/root/a.txt");
        assert_eq!(a.counts.remove, 1);
        assert_eq!(a.counts.rename, 1);
        assert!(a.deleted);
    }

    #[test]
    fn test_atomic_temp_never_creates_entry() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::default();
        let mut proc = processor();

        let mutated = proc.process(
            &mut registry,
            &mut backend,
            &Notification::new("/root/.goutputstream-XYZ123", OpKinds::CREATE),
            Instant::now(),
        );

        assert!(!mutated);
        assert!(registry.is_empty());
        assert_eq!(proc.tally().atomic_events, 1);
        assert_eq!(proc.tally().total_events, 0);
    }

    #[test]
    fn test_stat_failure_defaults_to_file() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::default();
        let mut proc = processor();

        proc.process(&mut registry, &mut backend, &Notification::new("/root/gone", OpKinds::CREATE), Instant::now());

        assert!(!entry(&registry, "/root/gone").is_dir);
        assert!(backend.registered.is_empty());
        assert!(proc.tally().last_error.is_none());
    }

    #[test]
    fn test_rename_directory_cascades_to_descendants_only() {
        let mut registry = PathRegistry::from_entries([
            Entry::new("/root/dir", true),
            Entry::new("/root/dir/f.txt", false),
            Entry::new("/root/dir2", true),
            Entry::new("/root/other.txt", false),
        ]);
        let mut backend = FakeBackend::default();
        let mut proc = processor();
        let now = Instant::now();

        proc.process(&mut registry, &mut backend, &Notification::new("/root/dir", OpKinds::RENAME), now);

        assert!(entry(&registry, "/root/dir").deleted);
        assert!(entry(&registry, "/root/dir/f.txt").deleted);
        assert_eq!(entry(&registry, "/root/dir/f.txt").last_event, Some(now));
        assert!(!entry(&registry, "/root/dir2").deleted);
        assert!(!entry(&registry, "/root/other.txt").deleted);
    }

    #[test]
    fn test_recreate_directory_restores_children_found_on_disk() {
        let mut registry = PathRegistry::from_entries([
            Entry::new("/root/dir", true),
            Entry::new("/root/dir/f.txt", false),
            Entry::new("/root/dir/gone.txt", false),
        ]);
        let mut backend = FakeBackend::default();
        let mut proc = processor();
        let start = Instant::now();

        proc.process(&mut registry, &mut backend, &Notification::new("/root/dir", OpKinds::RENAME), start);

        // Moved back: f.txt is on disk again, gone.txt is not, new.txt is new
        backend.files = [
            ("/root/dir", true),
            ("/root/dir/f.txt", false),
            ("/root/dir/sub", true),
            ("/root/dir/sub/new.txt", false),
        ]
        .iter()
        .map(|(p, d)| (PathBuf::from(p), *d))
        .collect();

        let later = start + Duration::from_secs(5);
        proc.process(&mut registry, &mut backend, &Notification::new("/root/dir", OpKinds::CREATE), later);

        assert!(!entry(&registry, "/root/dir").deleted);
        assert!(!entry(&registry, "/root/dir/f.txt").deleted);
        assert_eq!(entry(&registry, "/root/dir/f.txt").counts.create, 0);
        assert!(entry(&registry, "/root/dir/gone.txt").deleted);
        assert_eq!(entry(&registry, "/root/dir/gone.txt").last_event, Some(start));

        let new = entry(&registry, "/root/dir/sub/new.txt");
        assert!(!new.deleted);
        assert_eq!(new.last_event, Some(later));
        assert!(entry(&registry, "/root/dir/sub").is_dir);

        assert_eq!(
            backend.registered,
            vec![PathBuf::from("/root/dir"), PathBuf::from("/root/dir/sub")]
        );
        assert_eq!(registry.sorted_paths().len(), registry.len());
    }

    #[test]
    fn test_registration_failure_is_recorded_not_fatal() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::with(&[("/root/locked", true), ("/root/locked/a", false)]);
        backend.refuse.insert(PathBuf::from("/root/locked"));
        let mut proc = processor();

        proc.process(&mut registry, &mut backend, &Notification::new("/root/locked", OpKinds::CREATE), Instant::now());

        let err = proc.tally().last_error.clone().unwrap();
        assert!(err.contains("/root/locked"));
        assert!(registry.contains(Path::new("/root/locked/a")));
    }

    #[test]
    fn test_notification_outside_tree_is_tracked() {
        let mut registry = PathRegistry::from_entries([Entry::new("/root/a.txt", false)]);
        let mut backend = FakeBackend::default();
        let mut proc = processor();

        proc.process(&mut registry, &mut backend, &Notification::new("/elsewhere/x", OpKinds::WRITE), Instant::now());

        assert_eq!(entry(&registry, "/elsewhere/x").counts.write, 1);
        assert_eq!(registry.sorted_paths().len(), 2);
    }

    #[test]
    fn test_no_duplicates_after_mixed_sequence() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::with(&[("/r/d", true), ("/r/d/x", false), ("/r/y", false)]);
        let mut proc = processor();
        let now = Instant::now();

        let sequence = [
            ("/r/y", OpKinds::CREATE),
            ("/r/d/x", OpKinds::WRITE),
            ("/r/d", OpKinds::CREATE),
            ("/r/d", OpKinds::REMOVE),
            ("/r/d", OpKinds::CREATE),
            ("/r/y", OpKinds::RENAME),
            ("/r/d/x", OpKinds::CHMOD),
        ];
        for (path, kinds) in sequence {
            proc.process(&mut registry, &mut backend, &Notification::new(path, kinds), now);
        }

        let sorted = registry.sorted_paths();
        let unique: HashSet<_> = sorted.iter().collect();
        assert_eq!(unique.len(), sorted.len());
        assert_eq!(sorted.len(), registry.len());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_created_noise_directory_is_not_descended() {
        let mut registry = PathRegistry::new();
        let mut backend = FakeBackend::with(&[
            ("/r/node_modules", true),
            ("/r/node_modules/x", true),
            ("/r/node_modules/x/index.js", false),
        ]);
        let mut proc = processor();

        let created = Notification::new("/r/node_modules", OpKinds::CREATE);
        proc.process(&mut registry, &mut backend, &created, Instant::now());

        // The directory itself is still counted
        let dir = entry(&registry, "/r/node_modules");
        assert!(dir.is_dir);
        assert_eq!(dir.counts.create, 1);

        assert!(backend.registered.is_empty());
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(Path::new("/r/node_modules/x")));
        assert!(!registry.contains(Path::new("/r/node_modules/x/index.js")));
    }
}
