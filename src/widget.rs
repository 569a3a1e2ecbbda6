//! Home-screen widget refresh signals.
//!
//! Writers call [`refresh`] after a store write has completed. Refresh
//! failures are logged and dropped; they never fail the write that caused
//! them.

use std::future::Future;
use std::path::PathBuf;

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Widget {
    Notes,
    Tasks,
}

impl Widget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Tasks => "tasks",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no widget is listening for {0:?} refreshes")]
    NoSubscribers(Widget),

    #[error("failed to touch {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait WidgetNotifier: Send + Sync {
    fn refresh(&self, widget: Widget) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Signal `widget`, absorbing any failure.
pub async fn refresh<N: WidgetNotifier>(notifier: &N, widget: Widget) {
    match notifier.refresh(widget).await {
        Ok(()) => log::debug!("Refreshed {} widget", widget.name()),
        Err(e) => log::warn!("Widget refresh failed: {}", e),
    }
}

/// In-process notifier: widgets subscribe to a broadcast channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Widget>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Widget> {
        self.tx.subscribe()
    }
}

impl WidgetNotifier for ChannelNotifier {
    async fn refresh(&self, widget: Widget) -> Result<(), NotifyError> {
        self.tx
            .send(widget)
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers(widget))
    }
}

/// Out-of-process notifier: rewrites `<dir>/<widget>.stamp` with the
/// current time so a widget process can watch the file.
pub struct StampNotifier {
    dir: PathBuf,
}

impl StampNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn stamp_path(&self, widget: Widget) -> PathBuf {
        self.dir.join(format!("{}.stamp", widget.name()))
    }
}

impl WidgetNotifier for StampNotifier {
    async fn refresh(&self, widget: Widget) -> Result<(), NotifyError> {
        let path = self.stamp_path(widget);
        let stamp = chrono::Local::now().to_rfc3339();
        tokio::fs::write(&path, stamp)
            .await
            .map_err(|source| NotifyError::Io { path, source })
    }
}
