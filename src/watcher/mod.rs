//! Directory watcher that turns new text files into word-frequency reports

mod debounce;
mod handler;
mod source;

pub use debounce::Debouncer;
pub use handler::ReportHandler;
pub use source::{FileFilter, NotifySource, WatchEvent, WatchSource};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::analyzer::WordAnalyzer;
use crate::config::WatchConfig;
use crate::error::{self, Error, Result};

/// Default quiet period before a new file is analyzed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(4);

/// Lifecycle of a [`DirectoryWatchCoordinator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
    Stopped,
}

/// Runtime settings for a watch session
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub debounce: Duration,
    pub filter: FileFilter,
    pub report_extension: String,
    pub top_n: usize,
    pub scan_existing: bool,
}

impl WatchSettings {
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        Ok(Self {
            debounce: Duration::from_secs(config.debounce_seconds),
            filter: FileFilter::new(&config.pattern)?,
            report_extension: config.report_extension.clone(),
            top_n: config.top_n,
            scan_existing: config.scan_existing,
        })
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            filter: FileFilter::new("*.txt").expect("default pattern is valid"),
            report_extension: crate::report::DEFAULT_REPORT_EXTENSION.to_string(),
            top_n: crate::analyzer::DEFAULT_TOP_N,
            scan_existing: false,
        }
    }
}

/// Watches one directory, debounces creation events per file, and writes a
/// report for each file once it settles
pub struct DirectoryWatchCoordinator<S: WatchSource = NotifySource> {
    source: S,
    settings: WatchSettings,
    debouncer: Debouncer,
    handler: Arc<ReportHandler>,
    state: WatchState,
    directory: Option<PathBuf>,
    event_loop: Option<JoinHandle<()>>,
}

impl DirectoryWatchCoordinator<NotifySource> {
    /// Coordinator backed by the platform's native watcher
    pub fn native(settings: WatchSettings) -> Self {
        Self::new(NotifySource::new(), settings)
    }
}

impl<S: WatchSource> DirectoryWatchCoordinator<S> {
    pub fn new(source: S, settings: WatchSettings) -> Self {
        let handler = ReportHandler::new(
            WordAnalyzer::new(settings.top_n),
            settings.report_extension.clone(),
        );
        Self {
            source,
            settings,
            debouncer: Debouncer::new(),
            handler: Arc::new(handler),
            state: WatchState::Idle,
            directory: None,
            event_loop: None,
        }
    }

    /// Begin watching `path`. Must be called from within a tokio runtime.
    pub fn start(&mut self, path: &Path) -> Result<()> {
        match self.state {
            WatchState::Idle => {}
            WatchState::Watching => return Err(Error::InvalidState("already watching")),
            WatchState::Stopped => return Err(Error::InvalidState("coordinator was stopped")),
        }

        validate_directory(path)?;

        let rx = self.source.subscribe(path, &self.settings.filter)?;
        self.event_loop = Some(tokio::spawn(run_event_loop(
            rx,
            path.to_path_buf(),
            self.debouncer.clone(),
            Arc::clone(&self.handler),
            self.settings.debounce,
        )));
        self.state = WatchState::Watching;
        self.directory = Some(path.to_path_buf());
        info!(
            "Watching: {} (pattern: {}, debounce: {:?})",
            path.display(),
            self.settings.filter.as_str(),
            self.settings.debounce
        );

        if self.settings.scan_existing {
            self.schedule_existing(path);
        }

        Ok(())
    }

    /// Release the subscription and drop waits that have not fired.
    /// Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state == WatchState::Watching {
            if let Err(e) = self.source.unsubscribe() {
                error::log_error_chain("Failed to release watch subscription", &e);
            }
            if let Some(task) = self.event_loop.take() {
                task.abort();
            }
            // The aborted loop may still be mid-drain; closing makes any
            // schedule it issues from here on a no-op.
            let cancelled = self.debouncer.close();
            if let Some(dir) = &self.directory {
                info!(
                    "Stopped watching: {} ({} pending files dropped)",
                    dir.display(),
                    cancelled
                );
            }
        }
        self.state = WatchState::Stopped;
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn watched_dir(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Files waiting out their quiet period
    pub fn pending(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Total reports written during this session
    pub fn reports_written(&self) -> u64 {
        self.handler.reports_written()
    }

    /// Total files whose analysis or report write failed
    pub fn failures(&self) -> u64 {
        self.handler.failures()
    }

    fn schedule_existing(&self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to scan directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut scheduled = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && self.settings.filter.matches(&path) {
                schedule_report(&self.debouncer, &self.handler, path, self.settings.debounce);
                scheduled += 1;
            }
        }
        if scheduled > 0 {
            info!("Queued {} existing files in {}", scheduled, dir.display());
        }
    }
}

impl<S: WatchSource> Drop for DirectoryWatchCoordinator<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn validate_directory(path: &Path) -> Result<()> {
    let invalid = |source| Error::InvalidTarget {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(|e| invalid(Some(e)))?;
    if !metadata.is_dir() {
        return Err(invalid(None));
    }
    std::fs::read_dir(path).map_err(|e| invalid(Some(e)))?;
    Ok(())
}

async fn run_event_loop(
    mut rx: mpsc::UnboundedReceiver<WatchEvent>,
    dir: PathBuf,
    debouncer: Debouncer,
    handler: Arc<ReportHandler>,
    delay: Duration,
) {
    while let Some(event) = rx.recv().await {
        match event {
            WatchEvent::Created(path) => {
                info!("File detected: {}", path.display());
                schedule_report(&debouncer, &handler, path, delay);
            }
            WatchEvent::Error(e) => {
                error::log_error_chain(&format!("Watch error on {}", dir.display()), &e);
                crate::notifications::notify_watch_error(
                    &dir.display().to_string(),
                    &e.to_string(),
                );
            }
        }
    }
    debug!("Watch event stream for {} closed", dir.display());
}

fn schedule_report(
    debouncer: &Debouncer,
    handler: &Arc<ReportHandler>,
    path: PathBuf,
    delay: Duration,
) {
    let key = path.to_string_lossy().into_owned();
    let handler = Arc::clone(handler);
    debouncer.schedule(key, delay, move || async move {
        let shown = path.display().to_string();
        if let Err(e) = tokio::task::spawn_blocking(move || handler.handle(&path)).await {
            error!("Report task for {} failed: {}", shown, e);
        }
    });
}
