//! Word tallies and top-N ranking

use indexmap::IndexMap;
use serde::Serialize;

/// Word → occurrence count, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordTally {
    counts: IndexMap<String, u64>,
}

impl WordTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of an already-normalized word
    pub fn add(&mut self, word: &str) {
        if let Some(count) = self.counts.get_mut(word) {
            *count += 1;
        } else {
            self.counts.insert(word.to_string(), 1);
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word).copied()
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, &c)| (w.as_str(), c))
    }

    /// Highest-count words, ties kept in first-seen order
    pub fn top(&self, n: usize) -> TopWords {
        let mut ranked: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(w, &c)| (w.clone(), c))
            .collect();
        // sort_by is stable, so equal counts keep insertion order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        TopWords { ranked }
    }
}

/// Ordered (word, count) pairs, descending by count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopWords {
    ranked: Vec<(String, u64)>,
}

impl TopWords {
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, u64)] {
        &self.ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.ranked.iter().map(|(w, c)| (w.as_str(), *c))
    }
}

// Serialized as a JSON object so the ranking reads as { word: count }
impl Serialize for TopWords {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.ranked.len()))?;
        for (word, count) in &self.ranked {
            map.serialize_entry(word, count)?;
        }
        map.end()
    }
}
