//! wordwatch - word-frequency reports for new text files
//!
//! Watches a directory, waits for each new file to settle, then writes a JSON
//! summary of its word counts next to it.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod notifications;
pub mod report;
pub mod watcher;

pub use analyzer::{TopWords, WordAnalyzer, WordTally};
pub use config::Config;
pub use error::{Error, Result};
pub use report::{FileReport, ReportBuilder};
pub use watcher::{
    Debouncer, DirectoryWatchCoordinator, FileFilter, NotifySource, WatchEvent, WatchSettings,
    WatchSource, WatchState,
};

/// Current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Expand ~ and environment variables ($VAR, ${VAR}) in a path
pub fn expand_path(path: &std::path::Path) -> std::path::PathBuf {
    let path_str = path.to_string_lossy();

    // First expand ~ prefix
    let expanded = if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            home.join(stripped).to_string_lossy().to_string()
        } else {
            path_str.to_string()
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            home.to_string_lossy().to_string()
        } else {
            path_str.to_string()
        }
    } else {
        path_str.to_string()
    };

    // Then expand $VAR and ${VAR} patterns
    use std::sync::LazyLock;
    static ENV_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("invalid env regex")
    });

    let result = ENV_RE.replace_all(&expanded, |caps: &regex::Captures| {
        let var_name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    });

    std::path::PathBuf::from(result.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_expand_plain_path_unchanged() {
        assert_eq!(
            expand_path(Path::new("/srv/inbox")),
            PathBuf::from("/srv/inbox")
        );
    }

    #[test]
    fn test_expand_unknown_var_left_alone() {
        assert_eq!(
            expand_path(Path::new("/data/$WORDWATCH_SURELY_UNSET_VAR/in")),
            PathBuf::from("/data/$WORDWATCH_SURELY_UNSET_VAR/in")
        );
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path(Path::new("~/inbox")), home.join("inbox"));
        }
    }
}
