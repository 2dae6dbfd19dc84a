//! Dashboard state and message handling
//!
//! [`Dashboard`] owns the registry, the processor and the navigation state.
//! Every mutation goes through [`Dashboard::apply`], one message at a time;
//! the terminal runtime only translates input and draws [`View`] snapshots.

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tw_core::{
    visible_paths, Entry, EventProcessor, Navigator, Notification, PathRegistry, Tally,
    WatchBackend,
};

/// Keyboard input, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Backspace,
    Esc,
    /// Ctrl+C
    Interrupt,
    Other,
}

/// One unit of work for the loop
#[derive(Debug)]
pub enum Message {
    Notification(Notification),
    SourceError(String),
    SourceClosed,
    Tick,
    Key(Key),
    ScrollUp,
    ScrollDown,
    /// Terminal resized; only forces a redraw
    Resize,
}

/// What the loop should do after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Timing and scrolling knobs taken from [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub tombstone: Duration,
    pub highlight: Duration,
    pub viewport_rows: usize,
    pub scroll_amount: usize,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            tombstone: config.tombstone(),
            highlight: config.highlight(),
            viewport_rows: config.viewport_rows,
            scroll_amount: config.scroll_amount,
        }
    }
}

pub struct Dashboard<B: WatchBackend> {
    root: PathBuf,
    registry: PathRegistry,
    processor: EventProcessor,
    nav: Navigator,
    backend: B,
    settings: Settings,
    ticks: u64,
    source_open: bool,
}

impl<B: WatchBackend> Dashboard<B> {
    pub fn new(
        root: PathBuf,
        registry: PathRegistry,
        processor: EventProcessor,
        backend: B,
        settings: Settings,
    ) -> Self {
        Self {
            root,
            registry,
            processor,
            nav: Navigator::new(settings.viewport_rows),
            backend,
            settings,
            ticks: 0,
            source_open: true,
        }
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn tally(&self) -> &Tally {
        self.processor.tally()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_source_open(&self) -> bool {
        self.source_open
    }

    /// Apply one message and re-establish the cursor invariant
    pub fn apply(&mut self, msg: Message, now: Instant) -> Control {
        match msg {
            Message::Notification(notification) => {
                self.processor
                    .process(&mut self.registry, &mut self.backend, &notification, now);
            }
            Message::SourceError(err) => {
                warn!("Watcher error: {}", err);
                self.processor.record_error(err);
            }
            Message::SourceClosed => {
                if self.source_open {
                    info!("Notification source closed");
                }
                self.source_open = false;
            }
            Message::Tick => self.ticks = self.ticks.wrapping_add(1),
            Message::Resize => {}
            Message::ScrollUp => self.nav.up(self.settings.scroll_amount),
            Message::ScrollDown => {
                let visible = self.visible_count(now);
                self.nav.down(self.settings.scroll_amount, visible);
            }
            Message::Key(key) => {
                if self.on_key(key, now) == Control::Quit {
                    info!("Quit requested");
                    return Control::Quit;
                }
            }
        }

        let visible = self.visible_count(now);
        self.nav.clamp(visible);
        Control::Continue
    }

    fn on_key(&mut self, key: Key, now: Instant) -> Control {
        if key == Key::Interrupt {
            return Control::Quit;
        }

        if self.nav.is_filtering() {
            match key {
                Key::Esc => {
                    let visible =
                        visible_paths(&self.registry, None, self.settings.tombstone, now).len();
                    self.nav.exit_filter(visible);
                }
                Key::Backspace => self.nav.pop_char(),
                Key::Char(c) if !c.is_control() => self.nav.push_char(c),
                Key::Up => self.nav.up(1),
                Key::Down => {
                    let visible = self.visible_count(now);
                    self.nav.down(1, visible);
                }
                _ => {}
            }
            return Control::Continue;
        }

        match key {
            Key::Char('q') | Key::Esc => return Control::Quit,
            Key::Char('/') => self.nav.enter_filter(),
            Key::Up | Key::Char('k') => self.nav.up(1),
            Key::Down | Key::Char('j') => {
                let visible = self.visible_count(now);
                self.nav.down(1, visible);
            }
            _ => {}
        }
        Control::Continue
    }

    fn visible_count(&self, now: Instant) -> usize {
        self.nav
            .visible(&self.registry, self.settings.tombstone, now)
            .len()
    }

    /// Snapshot of everything the presentation layer draws
    pub fn view(&self, now: Instant) -> View<'_> {
        let visible = self.nav.visible(&self.registry, self.settings.tombstone, now);
        let total = visible.len();
        let range = self.nav.window(total);
        let start = range.start;

        let rows = visible[range]
            .iter()
            .enumerate()
            .filter_map(|(i, path)| self.registry.get(path).map(|entry| (start + i, entry)))
            .map(|(index, entry)| Row {
                depth: depth_below(&self.root, &entry.path),
                name: base_name(&entry.path),
                selected: index == self.nav.cursor(),
                recent: entry.is_recent(now, self.settings.highlight),
                entry,
            })
            .collect();

        View {
            root: &self.root,
            rows,
            scroll_offset: self.nav.scroll_offset(),
            viewport: self.nav.viewport(),
            visible_total: total,
            filter: self.nav.filter(),
            blink_on: self.ticks % 2 == 0,
            tally: self.processor.tally(),
        }
    }
}

/// Per-frame data for drawing
#[derive(Debug)]
pub struct View<'a> {
    pub root: &'a Path,
    /// Only the rows inside the scroll window
    pub rows: Vec<Row<'a>>,
    pub scroll_offset: usize,
    pub viewport: usize,
    pub visible_total: usize,
    /// Filter text while in filter mode
    pub filter: Option<&'a str>,
    pub blink_on: bool,
    pub tally: &'a Tally,
}

impl View<'_> {
    /// 1-based `(start, end)` of the shown rows, for pagination
    pub fn page(&self) -> (usize, usize) {
        if self.visible_total == 0 {
            return (0, 0);
        }
        let start = self.scroll_offset + 1;
        let end = (self.scroll_offset + self.viewport).min(self.visible_total);
        (start, end)
    }
}

#[derive(Debug)]
pub struct Row<'a> {
    pub entry: &'a Entry,
    pub depth: usize,
    pub name: String,
    pub selected: bool,
    pub recent: bool,
}

fn depth_below(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count().saturating_sub(1))
        .unwrap_or(0)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
