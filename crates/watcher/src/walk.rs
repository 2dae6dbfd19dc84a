//! Recursive tree walk
//!
//! Produces the list of discovered paths without side effects; watch
//! registration and registry insertion are applied by the caller.

use std::io;
use std::path::Path;
use tracing::{debug, warn};
use tw_core::{Discovered, Error, Result, SkipPolicy};
use walkdir::WalkDir;

/// Walk everything strictly below `root`
///
/// Noise directories are neither returned nor descended into. Atomic-save
/// temp files are dropped. Only a failure to read `root` itself is an error;
/// unreadable children are logged and skipped.
pub fn walk_tree(root: &Path, policy: &SkipPolicy) -> Result<Vec<Discovered>> {
    let mut discovered = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && policy.is_noise_dir(e.path())));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::InitialScan {
                    root: root.to_path_buf(),
                    source: io::Error::from(e),
                });
            }
            Err(e) => {
                warn!("Skipping unreadable path during walk: {}", e);
                continue;
            }
        };

        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(Error::InitialScan {
                    root: root.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                });
            }
            continue;
        }

        let is_dir = entry.file_type().is_dir();
        if !is_dir && policy.is_atomic_temp(entry.path()) {
            debug!("Ignoring atomic-save temp file: {}", entry.path().display());
            continue;
        }

        discovered.push(Discovered::new(entry.into_path(), is_dir));
    }

    Ok(discovered)
}
