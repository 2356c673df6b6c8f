pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.65;
pub const DEFAULT_UNCERTAINTY_THRESHOLD: u8 = 70;

/// Engine limits shared by every stage. Built once from CLI flags and passed
/// down explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Maximum nesting depth of a hierarchy (first level is depth 1).
    pub max_depth: usize,
    /// Minimum similarity for a fuzzy header binding.
    pub fuzzy_threshold: f64,
    /// Node confidence below this is reported as uncertain.
    pub uncertainty_threshold: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            uncertainty_threshold: DEFAULT_UNCERTAINTY_THRESHOLD,
        }
    }
}

impl Limits {
    /// Highest 0-based indent level a flat header record may carry.
    pub fn max_indent_level(&self) -> usize {
        self.max_depth.saturating_sub(1)
    }
}
