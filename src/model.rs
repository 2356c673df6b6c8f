use serde::{Deserialize, Serialize};

/// One header of the flat, document-ordered header stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub id: String,
    pub depth_label: String,
    pub display_text: String,
    pub position_path: String,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default)]
    pub is_excluded: bool,
    #[serde(default)]
    pub indent_level: usize,
}

/// One authoritative header text of the current document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub display_text: String,
    pub depth_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_label: Option<String>,
}

/// Hierarchy tree exchange format. Level 0 is the synthetic root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "linkname", alias = "text", alias = "name")]
    pub display_text: String,
    #[serde(default, alias = "depth")]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default)]
    pub is_uncertain: bool,
    #[serde(default)]
    pub is_hallucinated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub sub_items: Vec<HierarchyItem>,
}

impl HierarchyItem {
    pub fn new(id: impl Into<String>, display_text: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            display_text: display_text.into(),
            level,
            position_path: None,
            confidence: None,
            is_uncertain: false,
            is_hallucinated: false,
            note: None,
            sub_items: Vec::new(),
        }
    }

    pub fn with_children(mut self, sub_items: Vec<HierarchyItem>) -> Self {
        self.sub_items = sub_items;
        self
    }
}

/// Accepts either a single root item or a bare list of first-level items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HierarchyInput {
    Root(HierarchyItem),
    Items(Vec<HierarchyItem>),
}

impl HierarchyInput {
    pub fn into_root(self) -> HierarchyItem {
        match self {
            Self::Root(item) if item.level == 0 => item,
            Self::Root(item) => HierarchyItem::new("root", "", 0).with_children(vec![item]),
            Self::Items(items) => HierarchyItem::new("root", "", 0).with_children(items),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFileEntry {
    pub path: String,
    pub sha256: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinePaths {
    pub cache_root: String,
    pub corpus_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MineCounts {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub patterns_total: usize,
    pub observations_total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MineRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: MinePaths,
    pub counts: MineCounts,
    pub source_hashes: Vec<CorpusFileEntry>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionManifestEntry {
    pub order: usize,
    pub node_id: String,
    pub title: String,
    pub file: String,
    pub start_position: String,
    pub end_position: Option<String>,
    pub element_count: usize,
    pub is_empty: bool,
    pub is_exact_match: bool,
    pub is_duplicate: bool,
    pub duplicate_count: usize,
    pub depth_shift: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub document: String,
    pub document_sha256: String,
    pub hierarchy: String,
    pub section_count: usize,
    pub unmatched_nodes: Vec<String>,
    pub sections: Vec<SectionManifestEntry>,
    pub warnings: Vec<String>,
}
