//! Terminal runtime
//!
//! Sets up the watcher and the terminal, then runs the message loop:
//! one item from the notification source, a timer tick, or a terminal
//! event per iteration, each applied to the [`Dashboard`] before the next
//! frame is drawn.

use crate::app::{Control, Dashboard, Key, Message, Settings};
use crate::config::Config;
use crate::icons::Icons;
use crate::ui::{self, Theme};
use anyhow::{Context, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tw_core::{Discovered, Error, EventProcessor, PathRegistry, SkipPolicy};
use watcher::{NotificationSource, SourceItem, WatchManager};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Set while the terminal is in raw mode; the panic hook checks it
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Resolve the directory to monitor to an absolute path
pub fn resolve_root(path: Option<PathBuf>) -> tw_core::Result<PathBuf> {
    let path = path.unwrap_or_else(|| PathBuf::from("."));
    path.canonicalize()
        .map_err(|source| Error::InitialScan { root: path, source })
}

/// Everything the loop needs, built before the terminal is touched
struct Session {
    dashboard: Dashboard<WatchManager>,
    source: NotificationSource,
}

fn start_session(config: &Config, root: &Path) -> Result<Session> {
    let policy = SkipPolicy::new(&config.skip).context("Invalid skip configuration")?;
    let (mut manager, source) = WatchManager::new(policy.clone())?;

    let scan = manager.register_tree(root)?;
    info!(
        "Monitoring {} ({} paths, {} watch failures)",
        root.display(),
        scan.discovered.len(),
        scan.failures.len()
    );

    let registry = PathRegistry::from_entries(scan.discovered.into_iter().map(Discovered::into_entry));
    let mut processor = EventProcessor::new(policy);
    if let Some(err) = scan.failures.last() {
        processor.record_error(err);
    }

    let dashboard = Dashboard::new(
        root.to_path_buf(),
        registry,
        processor,
        manager,
        Settings::from(config),
    );
    Ok(Session { dashboard, source })
}

/// Run the dashboard until the user quits
pub async fn run(config: Config, root: PathBuf) -> Result<()> {
    let Session {
        mut dashboard,
        mut source,
    } = start_session(&config, &root)?;
    let theme = Theme::new(Icons::select(config.nerd_fonts), config.strings.clone());

    let mut guard = TerminalGuard::enter().context("Failed to set up terminal")?;
    let result = event_loop(&mut guard.terminal, &mut dashboard, &mut source, &theme, &config).await;

    dashboard.backend_mut().close();
    drop(guard);
    result
}

async fn event_loop(
    terminal: &mut Tui,
    dashboard: &mut Dashboard<WatchManager>,
    source: &mut NotificationSource,
    theme: &Theme,
    config: &Config,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(config.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::draw(frame, &dashboard.view(Instant::now()), theme))
            .context("Failed to draw frame")?;

        let source_open = dashboard.is_source_open();
        let msg = tokio::select! {
            item = source.next(), if source_open => match item {
                Some(SourceItem::Notification(n)) => Message::Notification(n),
                Some(SourceItem::Error(e)) => Message::SourceError(e.to_string()),
                None => Message::SourceClosed,
            },
            _ = ticker.tick() => Message::Tick,
            event = input.next() => match event {
                Some(Ok(event)) => match translate(event) {
                    Some(msg) => msg,
                    None => continue,
                },
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => return Ok(()),
            },
        };

        if dashboard.apply(msg, Instant::now()) == Control::Quit {
            return Ok(());
        }
    }
}

/// Map a terminal event to a loop message
fn translate(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(Message::Key(map_key(key))),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(Message::ScrollUp),
            MouseEventKind::ScrollDown => Some(Message::ScrollDown),
            _ => None,
        },
        Event::Resize(..) => Some(Message::Resize),
        _ => None,
    }
}

fn map_key(key: KeyEvent) -> Key {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Esc => Key::Esc,
        _ => Key::Other,
    }
}

/// Raw mode, alternate screen and mouse capture for the guard's lifetime
///
/// Restores the terminal on drop and from a panic hook, so a crash leaves a
/// usable shell behind.
struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            prev(info);
        }));

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            restore_terminal();
            return Err(e);
        }

        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_terminal();
                return Err(e);
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

/// Idempotent terminal restoration
fn restore_terminal() {
    if TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
    }
}
