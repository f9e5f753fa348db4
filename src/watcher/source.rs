//! Watch subscriptions - where file-creation events come from

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Event delivered by a watch subscription
#[derive(Debug)]
pub enum WatchEvent {
    /// A file matching the subscription filter was created
    Created(PathBuf),
    /// The notification facility reported a fault
    Error(Error),
}

/// Glob filter applied to file names (e.g. `*.txt`)
#[derive(Debug, Clone)]
pub struct FileFilter {
    pattern: glob::Pattern,
}

impl FileFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = glob::Pattern::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Match against the file name only, ignoring the directory
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.pattern.matches(name))
    }
}

/// A source of directory notifications
///
/// Implementations deliver events on their own context and push them into the
/// returned channel. Dropping the sender ends the stream.
pub trait WatchSource: Send {
    /// Start observing `dir` for new files matching `filter`
    fn subscribe(
        &mut self,
        dir: &Path,
        filter: &FileFilter,
    ) -> Result<mpsc::UnboundedReceiver<WatchEvent>>;

    /// Release the subscription. Safe to call when not subscribed.
    fn unsubscribe(&mut self) -> Result<()>;
}

/// Watch source backed by the platform's native notification API
pub struct NotifySource {
    poll_interval: Duration,
    active: Option<(RecommendedWatcher, PathBuf)>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::with_poll_interval(Duration::from_secs(2))
    }

    /// Poll interval used when the platform falls back to polling
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            active: None,
        }
    }
}

impl Default for NotifySource {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSource for NotifySource {
    fn subscribe(
        &mut self,
        dir: &Path,
        filter: &FileFilter,
    ) -> Result<mpsc::UnboundedReceiver<WatchEvent>> {
        if self.active.is_some() {
            return Err(Error::InvalidState("watch source already subscribed"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let filter = filter.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                let events: Vec<WatchEvent> = match res {
                    Ok(event) => match event.kind {
                        EventKind::Create(_) => event
                            .paths
                            .into_iter()
                            .filter(|p| filter.matches(p))
                            .map(WatchEvent::Created)
                            .collect(),
                        kind => {
                            trace!("Ignoring event kind: {:?}", kind);
                            Vec::new()
                        }
                    },
                    Err(e) => vec![WatchEvent::Error(Error::WatchFacility(e))],
                };

                for event in events {
                    if tx.send(event).is_err() {
                        debug!("Watch event dropped; receiver closed");
                        break;
                    }
                }
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.active = Some((watcher, dir.to_path_buf()));
        Ok(rx)
    }

    fn unsubscribe(&mut self) -> Result<()> {
        if let Some((mut watcher, dir)) = self.active.take() {
            if let Err(e) = watcher.unwatch(&dir) {
                // The directory may already be gone; the watcher is dropped regardless
                warn!("Failed to unwatch {}: {}", dir.display(), e);
            }
        }
        Ok(())
    }
}
