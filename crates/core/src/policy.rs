//! Skip policy for noise directories and atomic-save temp files
//!
//! Two sources of exclusions, both configurable:
//! 1. Noise directories (exact base-name match, never watched or descended)
//! 2. Atomic-save temp files (gitignore-style globs on the base name)

use crate::error::{Error, Result};
use ahash::AHashSet;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Skip configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipConfig {
    /// Directory base names that are never watched (default: .git, node_modules, .idea)
    #[serde(default = "default_noise_dirs")]
    pub noise_dirs: Vec<String>,

    /// Base-name globs for editor atomic-save temp files
    #[serde(default = "default_atomic_patterns")]
    pub atomic_patterns: Vec<String>,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            noise_dirs: default_noise_dirs(),
            atomic_patterns: default_atomic_patterns(),
        }
    }
}

fn default_noise_dirs() -> Vec<String> {
    vec![".git".to_string(), "node_modules".to_string(), ".idea".to_string()]
}

fn default_atomic_patterns() -> Vec<String> {
    // GTK/GNOME save-replace temp files
    vec![".goutputstream-*".to_string()]
}

/// Compiled skip rules
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    noise_dirs: AHashSet<String>,
    atomic: Gitignore,
}

impl SkipPolicy {
    /// Compile a policy from configuration
    pub fn new(config: &SkipConfig) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("/");
        for pattern in &config.atomic_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
        }
        let atomic = builder.build().map_err(|e| Error::InvalidPattern {
            pattern: config.atomic_patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self {
            noise_dirs: config.noise_dirs.iter().cloned().collect(),
            atomic,
        })
    }

    /// Directory whose base name is in the noise set
    pub fn is_noise_dir(&self, path: &Path) -> bool {
        base_name(path).is_some_and(|name| self.noise_dirs.contains(name))
    }

    /// File whose base name matches an atomic-save temp pattern
    pub fn is_atomic_temp(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.atomic.matched(Path::new(name), false).is_ignore(),
            None => false,
        }
    }
}

fn base_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
