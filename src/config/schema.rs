//! Configuration schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Watch and report settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable desktop notifications for errors
    #[serde(default)]
    pub notifications_enabled: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            notifications_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for the watched directory and its reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to watch when none is given on the command line
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Seconds of quiet before a new file is analyzed (debounce)
    #[serde(default = "default_debounce")]
    pub debounce_seconds: u64,

    /// Glob for file names to analyze
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Extension given to report files
    #[serde(default = "default_report_extension")]
    pub report_extension: String,

    /// Number of entries in the top-words ranking
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Also analyze matching files already present when watching starts
    #[serde(default)]
    pub scan_existing: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directory: None,
            debounce_seconds: default_debounce(),
            pattern: default_pattern(),
            report_extension: default_report_extension(),
            top_n: default_top_n(),
            scan_existing: false,
        }
    }
}

fn default_debounce() -> u64 {
    4
}

fn default_pattern() -> String {
    "*.txt".to_string()
}

fn default_report_extension() -> String {
    crate::report::DEFAULT_REPORT_EXTENSION.to_string()
}

fn default_top_n() -> usize {
    crate::analyzer::DEFAULT_TOP_N
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.watch.debounce_seconds, 4);
        assert_eq!(config.watch.pattern, "*.txt");
        assert_eq!(config.watch.report_extension, "json");
        assert_eq!(config.watch.top_n, 10);
        assert!(config.watch.directory.is_none());
        assert!(!config.watch.scan_existing);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [general]
            log_level = "debug"
            notifications_enabled = true

            [watch]
            directory = "~/Inbox"
            debounce_seconds = 2
            pattern = "*.md"
            report_extension = "report.json"
            top_n = 5
            scan_existing = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(config.general.notifications_enabled);
        assert_eq!(
            config.watch.directory.as_deref(),
            Some(std::path::Path::new("~/Inbox"))
        );
        assert_eq!(config.watch.debounce_seconds, 2);
        assert_eq!(config.watch.pattern, "*.md");
        assert_eq!(config.watch.report_extension, "report.json");
        assert_eq!(config.watch.top_n, 5);
        assert!(config.watch.scan_existing);
    }
}
