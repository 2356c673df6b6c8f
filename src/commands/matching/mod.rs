use std::collections::{HashMap, HashSet};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use strsim::normalized_levenshtein;
use tracing::{info, warn};

use crate::cli::MatchArgs;
use crate::document::{self, Document, DocumentHeader, NodeId};
use crate::hierarchy::{HierarchyTree, NodeIndex};
use crate::model::HierarchyInput;
use crate::text::match_key;
use crate::util::{read_json, write_json_stdout};

mod duplicates;
mod matcher;
mod run;

pub use duplicates::tag_duplicates;
pub use matcher::{HeaderMatch, MatchReport, locator_mismatches, match_headers};
#[cfg(test)]
use matcher::similarity;
pub use run::run;
