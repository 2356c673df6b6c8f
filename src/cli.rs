use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::settings::{
    DEFAULT_FUZZY_THRESHOLD, DEFAULT_MAX_DEPTH, DEFAULT_UNCERTAINTY_THRESHOLD, Limits,
};

#[derive(Parser, Debug)]
#[command(
    name = "sectionizer",
    version,
    about = "Hierarchy reconstruction and section extraction for flattened document headers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the pattern database from a corpus of validated hierarchies.
    Mine(MineArgs),
    /// Check a candidate hierarchy against the document's header whitelist.
    Validate(ValidateArgs),
    /// Indent, outdent, or exclude headers and flatten them into a hierarchy.
    Edit(EditArgs),
    /// Bind hierarchy nodes to the document's header elements.
    Match(MatchArgs),
    /// Carve the document into normalized per-section fragments.
    Extract(ExtractArgs),
    /// Rebase header depths of one fragment so its first header is h1.
    Normalize(NormalizeArgs),
    /// Summarize the persisted pattern database.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    pub fuzzy_threshold: f64,

    #[arg(long, default_value_t = DEFAULT_UNCERTAINTY_THRESHOLD)]
    pub uncertainty_threshold: u8,
}

impl LimitArgs {
    pub fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth.max(1),
            fuzzy_threshold: self.fuzzy_threshold.clamp(0.0, 1.0),
            uncertainty_threshold: self.uncertainty_threshold.min(100),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MineArgs {
    #[arg(long, default_value = ".cache/sectionizer")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub corpus_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub json_export_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/sectionizer")]
    pub cache_root: PathBuf,

    /// Candidate hierarchy (JSON exchange format).
    #[arg(long)]
    pub candidate: PathBuf,

    /// Whitelist as JSON, or the transformed document to derive it from.
    #[arg(long)]
    pub whitelist: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Score nodes against the mined pattern database.
    #[arg(long, default_value_t = false)]
    pub with_patterns: bool,

    /// Ignore patterns seen in fewer than this share of corpus documents.
    #[arg(long, default_value_t = 0.0)]
    pub min_pattern_confidence: f64,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Header records as JSON, or the transformed document to derive them from.
    #[arg(long)]
    pub headers: PathBuf,

    /// Ordered edit operations: `indent:<id,..>`, `outdent:<id,..>`,
    /// `exclude:<id,..>`, `include:<id,..>`, `reset`.
    #[arg(long = "op")]
    pub ops: Vec<String>,

    #[arg(long)]
    pub headers_out: Option<PathBuf>,

    #[arg(long)]
    pub hierarchy_out: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[arg(long)]
    pub hierarchy: PathBuf,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub hierarchy: PathBuf,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub skip_normalize: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[arg(long)]
    pub input: PathBuf,

    /// Defaults to rewriting the input in place.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/sectionizer")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn default_db_path(cache_root: &std::path::Path, db_path: Option<&PathBuf>) -> PathBuf {
    db_path
        .cloned()
        .unwrap_or_else(|| cache_root.join("patterns.sqlite"))
}
