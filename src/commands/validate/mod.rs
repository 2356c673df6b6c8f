use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{ValidateArgs, default_db_path};
use crate::headers::load_whitelist;
use crate::hierarchy::{HierarchyTree, NodeIndex};
use crate::model::{HierarchyInput, WhitelistEntry};
use crate::patterns::{PatternDatabase, open_pattern_database};
use crate::text::pattern_key;
use crate::util::{read_json, write_json_pretty, write_json_stdout};

mod run;
mod scorer;
mod validator;

pub use run::run;
pub use scorer::{NodeScorer, PatternScorer};
pub use validator::{apply_annotations, validate_candidate};
