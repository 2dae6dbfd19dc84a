//! File system watching for teawatch
//!
//! This crate provides:
//! - Per-directory, non-recursive watch registration with a skip policy
//! - A side-effect-free recursive walk used for the initial scan and re-scans
//! - Translation of raw `notify` events into core notifications
//! - A one-at-a-time notification source for the dashboard loop

pub mod manager;
pub mod source;
pub mod walk;

pub use manager::{TreeScan, WatchManager};
pub use source::{notifications_from, NotificationSource, SourceItem, SourceSink};
pub use walk::walk_tree;
