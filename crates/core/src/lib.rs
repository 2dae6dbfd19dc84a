//! Change aggregation and path state for teawatch
//!
//! This crate provides:
//! - Per-path event history (`Entry`, `OpKinds`)
//! - The path registry with stable lexicographic ordering
//! - Noise-directory and atomic-save skip rules
//! - The event processor (one notification at a time)
//! - Visible-path filtering with cursor/scroll navigation

pub mod entry;
pub mod error;
pub mod policy;
pub mod processor;
pub mod registry;
pub mod visibility;

// Re-exports
pub use entry::{Counters, Entry, Notification, OpKinds};
pub use error::{Error, Result};
pub use policy::{SkipConfig, SkipPolicy};
pub use processor::{Discovered, EventProcessor, Tally, WatchBackend};
pub use registry::PathRegistry;
pub use visibility::{scroll_for, visible_paths, Navigator};
