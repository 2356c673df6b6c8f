//! Pattern database: how section titles are typically placed across a corpus
//! of validated hierarchies.
//!
//! The database is built once by `commands::mine`, then handed by reference to
//! whatever needs it. Nothing here is mutable after construction.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

mod store;
#[cfg(test)]
mod tests;

pub use store::{
    configure_connection, ensure_schema, load_pattern_database, open_pattern_database,
    save_pattern_database,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentFrequency {
    pub normalized_title: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPattern {
    pub normalized_title: String,
    pub original_title_variants: Vec<String>,
    pub depth_frequency: BTreeMap<u32, usize>,
    /// Sorted by descending frequency.
    pub typical_parents: Vec<ParentFrequency>,
    pub total_occurrences: usize,
    pub confidence: f64,
}

impl SectionPattern {
    /// Depth with the most occurrences; the shallower depth wins a tie.
    pub fn most_common_depth(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for (&depth, &count) in &self.depth_frequency {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((depth, count));
            }
        }
        best.map(|(depth, _)| depth)
    }

    /// Share of this pattern's occurrences seen at `depth`.
    pub fn depth_share(&self, depth: u32) -> f64 {
        let total: usize = self.depth_frequency.values().sum();
        if total == 0 {
            return 0.0;
        }
        self.depth_frequency.get(&depth).copied().unwrap_or(0) as f64 / total as f64
    }

    /// Share of the recorded parent observations attributed to `parent`.
    pub fn parent_share(&self, parent: &str) -> f64 {
        let total: usize = self.typical_parents.iter().map(|entry| entry.frequency).sum();
        if total == 0 {
            return 0.0;
        }
        self.typical_parents
            .iter()
            .find(|entry| entry.normalized_title == parent)
            .map_or(0.0, |entry| entry.frequency as f64 / total as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDatabase {
    /// Sorted by descending confidence, then title.
    pub patterns: Vec<SectionPattern>,
    pub corpus_size: usize,
    pub built_at: String,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PatternDatabase {
    pub fn new(mut patterns: Vec<SectionPattern>, corpus_size: usize, built_at: String) -> Self {
        patterns.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.normalized_title.cmp(&b.normalized_title))
        });

        let index = patterns
            .iter()
            .enumerate()
            .map(|(position, pattern)| (pattern.normalized_title.clone(), position))
            .collect();

        Self {
            patterns,
            corpus_size,
            built_at,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, normalized_title: &str) -> Option<&SectionPattern> {
        self.index
            .get(normalized_title)
            .map(|&position| &self.patterns[position])
    }

    /// Patterns whose key equals `normalized_title` with confidence at or
    /// above `min_confidence`. Keys are unique, so this holds at most one.
    pub fn find_matches(&self, normalized_title: &str, min_confidence: f64) -> Vec<&SectionPattern> {
        self.get(normalized_title)
            .filter(|pattern| pattern.confidence >= min_confidence)
            .into_iter()
            .collect()
    }

    /// Most frequent parent of the best pattern for `normalized_title`.
    pub fn find_most_likely_parent(&self, normalized_title: &str) -> Option<&str> {
        self.find_matches(normalized_title, 0.0)
            .first()
            .and_then(|pattern| pattern.typical_parents.first())
            .map(|parent| parent.normalized_title.as_str())
    }
}
