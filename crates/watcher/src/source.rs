//! Notification source: raw `notify` events to core notifications
//!
//! The `notify` callback pushes into two unbounded channels (events and
//! errors). The dashboard loop pulls exactly one item per iteration with
//! [`NotificationSource::next`], so at most one notification is ever being
//! applied at a time.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::trace;
use tw_core::{Notification, OpKinds};

/// One item pulled from the source
#[derive(Debug)]
pub enum SourceItem {
    Notification(Notification),
    Error(notify::Error),
}

/// Sending half, owned by the `notify` callback
#[derive(Debug, Clone)]
pub struct SourceSink {
    events: mpsc::UnboundedSender<Notification>,
    errors: mpsc::UnboundedSender<notify::Error>,
}

impl SourceSink {
    pub fn send(&self, notification: Notification) {
        if self.events.send(notification).is_err() {
            trace!("Notification dropped: source closed");
        }
    }

    pub fn send_error(&self, err: notify::Error) {
        if self.errors.send(err).is_err() {
            trace!("Watcher error dropped: source closed");
        }
    }

    /// Translate and forward one raw `notify` result
    pub fn forward(&self, result: notify::Result<Event>) {
        match result {
            Ok(event) => {
                for notification in notifications_from(&event, |p| p.exists()) {
                    self.send(notification);
                }
            }
            Err(err) => self.send_error(err),
        }
    }
}

/// Receiving half, owned by the dashboard loop
#[derive(Debug)]
pub struct NotificationSource {
    events: mpsc::UnboundedReceiver<Notification>,
    errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl NotificationSource {
    /// Create a connected sink/source pair
    pub fn channel() -> (SourceSink, NotificationSource) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        (
            SourceSink {
                events: events_tx,
                errors: errors_tx,
            },
            NotificationSource {
                events: events_rx,
                errors: errors_rx,
            },
        )
    }

    /// Wait for the next notification or error
    ///
    /// Pending errors are delivered before pending notifications. Returns
    /// `None` once both queues are closed and drained. Cancel-safe, so it can
    /// be raced against other message sources in `tokio::select!`.
    pub async fn next(&mut self) -> Option<SourceItem> {
        tokio::select! {
            biased;
            Some(err) = self.errors.recv() => Some(SourceItem::Error(err)),
            Some(event) = self.events.recv() => Some(SourceItem::Notification(event)),
            else => None,
        }
    }
}

/// Map one raw event to per-path notifications
///
/// `exists` resolves renames whose direction the backend did not report.
pub fn notifications_from(event: &Event, exists: impl Fn(&Path) -> bool) -> Vec<Notification> {
    let uniform = |kinds: OpKinds| -> Vec<Notification> {
        event
            .paths
            .iter()
            .map(|p| Notification::new(p.clone(), kinds))
            .collect()
    };

    match event.kind {
        EventKind::Create(_) => uniform(OpKinds::CREATE),
        EventKind::Remove(_) => uniform(OpKinds::REMOVE),
        EventKind::Modify(ModifyKind::Metadata(_)) => uniform(OpKinds::CHMOD),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => uniform(OpKinds::RENAME),
            RenameMode::To => uniform(OpKinds::CREATE),
            // Backends that pair renames also emit the From and To halves
            RenameMode::Both => Vec::new(),
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|p| {
                    let kinds = if exists(p) { OpKinds::CREATE } else { OpKinds::RENAME };
                    Notification::new(p.clone(), kinds)
                })
                .collect(),
        },
        EventKind::Modify(_) => uniform(OpKinds::WRITE),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
