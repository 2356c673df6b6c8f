use super::*;

const DEPTH_WEIGHT: f64 = 0.6;
const PARENT_WEIGHT: f64 = 0.4;

/// Optional per-node confidence (0-100). `None` means the scorer has no
/// opinion about the node.
pub trait NodeScorer: Sync {
    fn score(&self, tree: &HierarchyTree, node: NodeIndex) -> Option<u8>;
}

/// Scores placement against the mined pattern database: how often the title
/// was seen at this depth and under this parent.
pub struct PatternScorer<'a> {
    database: &'a PatternDatabase,
    min_confidence: f64,
}

impl<'a> PatternScorer<'a> {
    pub fn new(database: &'a PatternDatabase) -> Self {
        Self {
            database,
            min_confidence: 0.0,
        }
    }

    /// Ignore patterns seen in fewer than this share of corpus documents.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

impl NodeScorer for PatternScorer<'_> {
    fn score(&self, tree: &HierarchyTree, node: NodeIndex) -> Option<u8> {
        let current = tree.node(node);
        let key = pattern_key(&current.display_text);
        let pattern = *self.database.find_matches(&key, self.min_confidence).first()?;

        let depth_share = pattern.depth_share(current.depth as u32);
        let agreement = match tree.parent_text(node) {
            Some(parent) => {
                DEPTH_WEIGHT * depth_share + PARENT_WEIGHT * pattern.parent_share(&pattern_key(parent))
            }
            None => depth_share,
        };

        Some((agreement * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}
