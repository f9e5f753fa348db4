//! File reports - assembling analysis results and writing them to disk

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzer::{TopWords, WordTally};
use crate::error::{Error, ReportWriteCause, Result};

/// Timestamp layout used in reports, e.g. `03-07-2025 02:05:09 PM`
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %I:%M:%S %p";

/// Default extension for report files
pub const DEFAULT_REPORT_EXTENSION: &str = "json";

fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Local>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

/// File attributes gathered independently of content scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_name: String,
    pub size_in_bytes: u64,
    pub modified: DateTime<Local>,
}

impl FileMetadata {
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::file_access(path, e))?;
        let modified = metadata.modified().map_err(|e| Error::file_access(path, e))?;

        Ok(Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_in_bytes: metadata.len(),
            modified: DateTime::<Local>::from(modified),
        })
    }
}

/// Word-frequency summary of a single file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileReport {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Local>,
    file_name: String,
    size_in_bytes: u64,
    #[serde(rename = "DateLastModified", serialize_with = "serialize_timestamp")]
    modified: DateTime<Local>,
    line_count: u64,
    #[serde(rename = "TopTenWords")]
    top_words: TopWords,
    #[serde(rename = "WordFrequencies")]
    tally: WordTally,
}

impl FileReport {
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    pub fn modified(&self) -> DateTime<Local> {
        self.modified
    }

    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    pub fn top_words(&self) -> &TopWords {
        &self.top_words
    }

    pub fn word_frequencies(&self) -> &WordTally {
        &self.tally
    }

    /// Pretty-printed JSON form of the report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builder for [`FileReport`]
#[derive(Debug)]
pub struct ReportBuilder {
    metadata: FileMetadata,
    timestamp: Option<DateTime<Local>>,
    line_count: u64,
    top_words: TopWords,
    tally: WordTally,
}

impl ReportBuilder {
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            timestamp: None,
            line_count: 0,
            top_words: TopWords::default(),
            tally: WordTally::default(),
        }
    }

    /// Override the analysis timestamp (defaults to now at build time)
    pub fn timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn line_count(mut self, line_count: u64) -> Self {
        self.line_count = line_count;
        self
    }

    pub fn top_words(mut self, top_words: TopWords) -> Self {
        self.top_words = top_words;
        self
    }

    pub fn tally(mut self, tally: WordTally) -> Self {
        self.tally = tally;
        self
    }

    pub fn build(self) -> FileReport {
        FileReport {
            timestamp: self.timestamp.unwrap_or_else(Local::now),
            file_name: self.metadata.file_name,
            size_in_bytes: self.metadata.size_in_bytes,
            modified: self.metadata.modified,
            line_count: self.line_count,
            top_words: self.top_words,
            tally: self.tally,
        }
    }
}

/// Path of the report that sits next to `source`
pub fn report_path(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}

/// Write `report` beside `source`, returning the report's path
pub fn write_report(report: &FileReport, source: &Path, extension: &str) -> Result<PathBuf> {
    let path = report_path(source, extension);

    let json = report.to_json().map_err(|e| Error::ReportWrite {
        path: path.clone(),
        source: ReportWriteCause::Serialize(e),
    })?;

    std::fs::write(&path, json).map_err(|e| Error::ReportWrite {
        path: path.clone(),
        source: ReportWriteCause::Io(e),
    })?;

    info!("Report written: {}", path.display());
    Ok(path)
}
