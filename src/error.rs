//! Error types for watching, analysis and report writing

use std::path::PathBuf;
use tracing::error;

/// Errors produced by the watch pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path handed to the coordinator is not a usable directory
    #[error("not a watchable directory: {}", path.display())]
    InvalidTarget {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The underlying notification facility reported a fault
    #[error("watch facility error")]
    WatchFacility(#[from] notify::Error),

    /// A file could not be opened, read, or stat'ed during analysis
    #[error("cannot access {}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialized or written
    #[error("failed to write report {}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: ReportWriteCause,
    },

    /// The coordinator was used out of order (e.g. started twice)
    #[error("invalid coordinator state: {0}")]
    InvalidState(&'static str),

    /// The configured file pattern is not a valid glob
    #[error("invalid file pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Underlying reason a report write failed
#[derive(Debug, thiserror::Error)]
pub enum ReportWriteCause {
    #[error("serialization failed")]
    Serialize(#[from] serde_json::Error),
    #[error("disk write failed")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a missing file (deleted between event and read)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileAccess { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Collect an error and all of its causes, outermost first
pub fn cause_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = Some(err);
    while let Some(e) = current {
        chain.push(e.to_string());
        current = e.source();
    }
    chain
}

/// Log an error followed by each nested cause on its own line
pub fn log_error_chain(context: &str, err: &(dyn std::error::Error + 'static)) {
    let chain = cause_chain(err);
    let mut causes = chain.iter();
    if let Some(head) = causes.next() {
        error!("{}: {}", context, head);
    }
    for (depth, cause) in causes.enumerate() {
        error!("  caused by [{}]: {}", depth + 1, cause);
    }
}
