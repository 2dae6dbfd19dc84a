//! Error taxonomy for the path-state engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or maintaining tracked tree state
#[derive(Debug, Error)]
pub enum Error {
    /// The root directory could not be walked at startup (fatal)
    #[error("cannot scan root directory '{}': {source}", root.display())]
    InitialScan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be registered for notifications (non-fatal)
    #[error("cannot watch '{}': {reason}", path.display())]
    WatchRegistration { path: PathBuf, reason: String },

    /// Stat failed for a notified path (non-fatal)
    #[error("cannot stat '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured atomic-save pattern failed to compile
    #[error("invalid atomic-save pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result type for path-state operations
pub type Result<T> = std::result::Result<T, Error>;
