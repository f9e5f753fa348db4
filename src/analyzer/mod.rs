//! Word-frequency analysis of text files

mod tally;

pub use tally::{TopWords, WordTally};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::report::{FileMetadata, FileReport, ReportBuilder};

/// Default size of the top-words ranking
pub const DEFAULT_TOP_N: usize = 10;

/// Characters that separate words. Anything else (apostrophes, digits,
/// underscores) stays inside a token.
const DELIMITERS: &[char] = &[
    ' ', '\t', '.', ',', '!', '?', ';', ':', '"', '(', ')', '[', ']', '{', '}', '-', '+', '&',
];

/// Split a line into raw tokens, dropping empties between adjacent delimiters
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(DELIMITERS).filter(|t| !t.is_empty())
}

/// Result of scanning a file's contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub line_count: u64,
    pub tally: WordTally,
}

/// Streams text files and tallies their words case-insensitively
#[derive(Debug, Clone)]
pub struct WordAnalyzer {
    top_n: usize,
}

impl Default for WordAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl WordAnalyzer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Count lines and words from any buffered reader.
    ///
    /// Lines end at `\n`, `\r\n` or a lone `\r`. Bytes that are not valid
    /// UTF-8 are replaced with U+FFFD rather than failing the scan.
    pub fn scan<R: BufRead>(&self, mut reader: R) -> std::io::Result<Scan> {
        let mut scan = Scan::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let chunk = buf.strip_suffix(b"\n").unwrap_or(&buf);
            let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
            for line in chunk.split(|&b| b == b'\r') {
                scan.line_count += 1;
                for token in tokenize(&String::from_utf8_lossy(line)) {
                    scan.tally.add(&token.to_lowercase());
                }
            }
        }

        Ok(scan)
    }

    /// Analyze a file on disk and build its report. Nothing is written.
    pub fn analyze(&self, path: &Path) -> Result<FileReport> {
        let metadata = FileMetadata::read(path)?;

        let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
        let scan = self
            .scan(BufReader::new(file))
            .map_err(|e| Error::file_access(path, e))?;

        debug!(
            "Scanned {}: {} lines, {} distinct words",
            path.display(),
            scan.line_count,
            scan.tally.len()
        );

        Ok(ReportBuilder::new(metadata)
            .line_count(scan.line_count)
            .top_words(scan.tally.top(self.top_n))
            .tally(scan.tally)
            .build())
    }
}
