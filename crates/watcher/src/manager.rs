//! Watch manager: decides which directories get watched
//!
//! Every directory is registered individually and non-recursively, so noise
//! directories stay unwatched and newly created directories must be added
//! explicitly as they appear.

use crate::source::{NotificationSource, SourceSink};
use crate::walk::walk_tree;
use anyhow::{Context, Result};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tracing::{debug, info, warn};
use tw_core::{Discovered, Error, SkipPolicy, WatchBackend};

/// Outcome of a full tree registration
#[derive(Debug, Default)]
pub struct TreeScan {
    /// Every path strictly below the root
    pub discovered: Vec<Discovered>,
    /// Directories that could not be registered (non-fatal)
    pub failures: Vec<Error>,
}

/// Owns the `notify` watcher and the skip policy
pub struct WatchManager {
    /// `None` once closed
    watcher: Option<RecommendedWatcher>,
    policy: SkipPolicy,
    /// Successful registrations so far
    registered: usize,
}

impl WatchManager {
    /// Create a watcher whose events flow into the returned source
    pub fn new(policy: SkipPolicy) -> Result<(Self, NotificationSource)> {
        let (sink, source) = NotificationSource::channel();
        let watcher = RecommendedWatcher::new(
            move |result| SourceSink::forward(&sink, result),
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        Ok((
            Self {
                watcher: Some(watcher),
                policy,
                registered: 0,
            },
            source,
        ))
    }

    /// Walk `root`, registering it and every directory below it
    ///
    /// Fails only if the root itself cannot be walked. Individual
    /// registration failures are collected in [`TreeScan::failures`].
    pub fn register_tree(&mut self, root: &Path) -> tw_core::Result<TreeScan> {
        let discovered = walk_tree(root, &self.policy)?;
        let mut scan = TreeScan::default();

        let dirs = std::iter::once(root).chain(
            discovered
                .iter()
                .filter(|d| d.is_dir)
                .map(|d| d.path.as_path()),
        );
        for dir in dirs {
            if let Err(e) = self.register_path(dir) {
                warn!("{}", e);
                scan.failures.push(e);
            }
        }

        info!(
            "Registered {} directories under {} ({} paths)",
            self.registered,
            root.display(),
            discovered.len()
        );
        scan.discovered = discovered;
        Ok(scan)
    }

    /// Register a single directory
    pub fn register_path(&mut self, dir: &Path) -> tw_core::Result<()> {
        let watcher = self.watcher.as_mut().ok_or_else(|| Error::WatchRegistration {
            path: dir.to_path_buf(),
            reason: "watcher is closed".to_string(),
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::WatchRegistration {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.registered += 1;
        debug!("Watching {}", dir.display());
        Ok(())
    }

    /// Drop the underlying watcher, which closes the notification source
    pub fn close(&mut self) {
        if self.watcher.take().is_some() {
            info!("File watcher closed");
        }
    }
}

impl WatchBackend for WatchManager {
    fn stat(&self, path: &Path) -> std::io::Result<bool> {
        std::fs::metadata(path).map(|m| m.is_dir())
    }

    fn walk(&self, root: &Path) -> Vec<Discovered> {
        walk_tree(root, &self.policy).unwrap_or_else(|e| {
            debug!("Re-walk failed: {}", e);
            Vec::new()
        })
    }

    fn register(&mut self, dir: &Path) -> tw_core::Result<()> {
        self.register_path(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceItem;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tw_core::{EventProcessor, Notification, OpKinds, PathRegistry, SkipConfig};

    fn policy() -> SkipPolicy {
        SkipPolicy::new(&SkipConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_register_tree_watches_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("a/file.txt"), b"x").unwrap();

        let (mut manager, _source) = WatchManager::new(policy()).unwrap();
        let scan = manager.register_tree(&root).unwrap();

        assert!(scan.failures.is_empty());
        assert_eq!(scan.discovered.len(), 3);
        // root, a, a/b
        assert_eq!(manager.registered, 3);
    }

    #[tokio::test]
    async fn test_register_tree_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (mut manager, _source) = WatchManager::new(policy()).unwrap();

        let err = manager.register_tree(&temp_dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::InitialScan { .. }));
    }

    #[tokio::test]
    async fn test_register_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (mut manager, mut source) = WatchManager::new(policy()).unwrap();

        manager.close();
        assert!(manager.watcher.is_none());

        let err = manager.register_path(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::WatchRegistration { .. }));

        // Closing drops the callback, so the source ends
        let next = tokio::time::timeout(Duration::from_secs(2), source.next()).await.unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_noise_directory_created_later_stays_unwatched() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let (mut manager, _source) = WatchManager::new(policy()).unwrap();
        let scan = manager.register_tree(&root).unwrap();
        assert!(scan.discovered.is_empty());
        let before = manager.registered;

        let modules = root.join("node_modules");
        fs::create_dir_all(modules.join("pkg/lib")).unwrap();
        fs::write(modules.join("pkg/lib/index.js"), b"").unwrap();

        let mut registry = PathRegistry::new();
        let mut processor = EventProcessor::new(policy());
        let created = Notification::new(modules.clone(), OpKinds::CREATE);
        processor.process(&mut registry, &mut manager, &created, std::time::Instant::now());

        assert_eq!(manager.registered, before);
        assert_eq!(registry.sorted_paths(), &[modules]);
    }

    #[tokio::test]
    async fn test_created_file_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let (mut manager, mut source) = WatchManager::new(policy()).unwrap();
        manager.register_tree(&root).unwrap();

        let file = root.join("new.txt");
        fs::write(&file, b"hello").unwrap();

        let found = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(item) = source.next().await {
                if let SourceItem::Notification(n) = item {
                    if n.path == file && n.kinds.contains(OpKinds::CREATE) {
                        return true;
                    }
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(found, "create notification for new.txt not observed");
    }
}
