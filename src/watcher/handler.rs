//! Handling for debounced files: analyze, write the report, log the outcome

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::analyzer::WordAnalyzer;
use crate::error::{self, Error, Result};
use crate::report;

/// Turns a settled file into a report next to it
#[derive(Debug)]
pub struct ReportHandler {
    analyzer: WordAnalyzer,
    report_extension: String,
    reports_written: AtomicU64,
    failures: AtomicU64,
}

impl ReportHandler {
    pub fn new(analyzer: WordAnalyzer, report_extension: impl Into<String>) -> Self {
        Self {
            analyzer,
            report_extension: report_extension.into(),
            reports_written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Analyze `path` and write its report. Errors are returned, not logged.
    pub fn process(&self, path: &Path) -> Result<PathBuf> {
        let report = self.analyzer.analyze(path)?;
        report::write_report(&report, path, &self.report_extension)
    }

    /// Process `path`, logging any failure. Never panics on per-file errors.
    pub fn handle(&self, path: &Path) {
        match self.process(path) {
            Ok(written) => {
                self.reports_written.fetch_add(1, Ordering::Relaxed);
                info!("Report complete: {} -> {}", path.display(), written.display());
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                report_failure(path, &e);
            }
        }
    }

    pub fn reports_written(&self) -> u64 {
        self.reports_written.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// How loudly a per-file failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    /// File vanished before it could be read; routine for temp files
    Quiet,
    Warn,
    Error,
}

fn severity(err: &Error) -> Severity {
    match err {
        _ if err.is_not_found() => Severity::Quiet,
        Error::FileAccess { .. } => Severity::Warn,
        _ => Severity::Error,
    }
}

fn report_failure(path: &Path, err: &Error) {
    match (severity(err), err) {
        (Severity::Quiet, _) => {
            debug!("File disappeared before processing: {}", path.display());
            return;
        }
        (Severity::Warn, Error::FileAccess { source, .. }) => {
            warn!("Skipping {}: {}: {}", path.display(), err, source);
        }
        _ => error::log_error_chain(&format!("Report failed for {}", path.display()), err),
    }
    crate::notifications::notify_file_error(&path.display().to_string(), &err.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_writes_report_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, "once upon a time").unwrap();

        let handler = ReportHandler::new(WordAnalyzer::default(), "json");
        handler.handle(&path);

        assert!(dir.path().join("story.json").exists());
        assert_eq!(handler.reports_written(), 1);
        assert_eq!(handler.failures(), 0);
    }

    #[test]
    fn test_handle_missing_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ReportHandler::new(WordAnalyzer::default(), "json");

        handler.handle(&dir.path().join("gone.txt"));
        assert_eq!(handler.failures(), 1);
        assert!(!dir.path().join("gone.json").exists());

        let path = dir.path().join("next.txt");
        std::fs::write(&path, "still works").unwrap();
        handler.handle(&path);
        assert_eq!(handler.reports_written(), 1);
    }

    #[test]
    fn test_failure_severity() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = WordAnalyzer::default();

        let gone = analyzer.analyze(&dir.path().join("gone.txt")).unwrap_err();
        assert_eq!(severity(&gone), Severity::Quiet);

        let denied = Error::file_access(
            dir.path().join("locked.txt"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(severity(&denied), Severity::Warn);

        assert_eq!(severity(&Error::InvalidState("stopped")), Severity::Error);
    }

    #[test]
    fn test_empty_file_gets_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let handler = ReportHandler::new(WordAnalyzer::default(), "json");
        let written = handler.process(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(value["LineCount"], 0);
        assert_eq!(value["SizeInBytes"], 0);
        assert_eq!(value["TopTenWords"], serde_json::json!({}));
        assert_eq!(value["WordFrequencies"], serde_json::json!({}));
    }
}
