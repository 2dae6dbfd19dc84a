//! Visible-path computation and cursor/scroll navigation
//!
//! Visibility is a pure function of the registry and the filter state.
//! Scrolling is derived from the cursor and never stored independently of it.

use crate::registry::PathRegistry;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Paths that should be shown right now, in registry order
///
/// Filtering matches the base name case-insensitively and ignores deletion
/// state. Without a filter, deleted entries older than `tombstone` are hidden.
pub fn visible_paths<'a>(
    registry: &'a PathRegistry,
    filter: Option<&str>,
    tombstone: Duration,
    now: Instant,
) -> Vec<&'a Path> {
    match filter {
        Some(text) => {
            let needle = text.to_lowercase();
            registry
                .sorted_paths()
                .iter()
                .filter(|path| base_name_lower(path).contains(&needle))
                .map(PathBuf::as_path)
                .collect()
        }
        None => registry
            .iter_sorted()
            .filter(|entry| !entry.is_expired(now, tombstone))
            .map(|entry| entry.path.as_path())
            .collect(),
    }
}

fn base_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// New scroll offset keeping `cursor` inside a `viewport`-row window
///
/// Shifts by the minimal amount necessary.
pub fn scroll_for(cursor: usize, offset: usize, viewport: usize) -> usize {
    let viewport = viewport.max(1);
    if cursor < offset {
        cursor
    } else if cursor >= offset + viewport {
        cursor + 1 - viewport
    } else {
        offset
    }
}

/// Cursor, scroll and filter state for the path list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    cursor: usize,
    scroll_offset: usize,
    viewport: usize,
    filter_text: String,
    filtering: bool,
}

impl Navigator {
    pub fn new(viewport: usize) -> Self {
        Self {
            cursor: 0,
            scroll_offset: 0,
            viewport: viewport.max(1),
            filter_text: String::new(),
            filtering: false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Filter to apply, if in filter mode
    pub fn filter(&self) -> Option<&str> {
        self.filtering.then_some(self.filter_text.as_str())
    }

    /// Compute visible paths for the current filter state
    pub fn visible<'a>(
        &self,
        registry: &'a PathRegistry,
        tombstone: Duration,
        now: Instant,
    ) -> Vec<&'a Path> {
        visible_paths(registry, self.filter(), tombstone, now)
    }

    /// Clamp the cursor into `[0, max(1, visible) )` and re-derive scroll
    pub fn clamp(&mut self, visible: usize) {
        if self.cursor >= visible {
            self.cursor = visible.saturating_sub(1);
        }
        self.scroll_offset = scroll_for(self.cursor, self.scroll_offset, self.viewport);
    }

    /// Move the cursor up by `n` rows
    pub fn up(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
        self.scroll_offset = scroll_for(self.cursor, self.scroll_offset, self.viewport);
    }

    /// Move the cursor down by `n` rows, stopping at the last visible row
    pub fn down(&mut self, n: usize, visible: usize) {
        let last = visible.saturating_sub(1);
        self.cursor = (self.cursor + n).min(last);
        self.scroll_offset = scroll_for(self.cursor, self.scroll_offset, self.viewport);
    }

    /// Enter filter mode with an empty filter at the top of the list
    pub fn enter_filter(&mut self) {
        self.filtering = true;
        self.filter_text.clear();
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    /// Leave filter mode; the cursor is only clamped afterwards
    pub fn exit_filter(&mut self, visible_after: usize) {
        self.filtering = false;
        self.filter_text.clear();
        self.clamp(visible_after);
    }

    pub fn push_char(&mut self, c: char) {
        self.filter_text.push(c);
    }

    pub fn pop_char(&mut self) {
        self.filter_text.pop();
    }

    /// Visible row range `[start, end)` for the current scroll offset
    pub fn window(&self, visible: usize) -> std::ops::Range<usize> {
        let start = self.scroll_offset.min(visible);
        let end = (self.scroll_offset + self.viewport).min(visible);
        start..end
    }
}
