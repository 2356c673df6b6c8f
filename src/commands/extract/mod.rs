use std::borrow::Cow;
use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::commands::matching::{MatchReport, locator_mismatches, match_headers};
use crate::commands::normalize::normalize_header_depths;
use crate::document::{self, Document, NodeId};
use crate::hierarchy::{HierarchyTree, NodeIndex};
use crate::model::{HierarchyInput, SectionManifest, SectionManifestEntry};
use crate::text::slugify;
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, write_json_pretty, write_text,
};

mod extractor;
mod planner;
mod run;

pub use extractor::{ExtractedSection, extract_section};
pub use planner::plan_sections;
pub use run::run;
