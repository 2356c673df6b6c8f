use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{MineArgs, default_db_path};
use crate::document::{self, Document, NodeId};
use crate::model::{
    CorpusFileEntry, HierarchyInput, HierarchyItem, MineCounts, MinePaths, MineRunManifest,
};
use crate::patterns::{
    ParentFrequency, PatternDatabase, SectionPattern, configure_connection, ensure_schema,
    save_pattern_database,
};
use crate::text::{condense_whitespace, pattern_key};
use crate::util::{
    ensure_directory, now_utc_string, sha256_bytes, utc_compact_string, write_json_pretty,
};

mod builder;
mod corpus;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use builder::*;
use corpus::*;
