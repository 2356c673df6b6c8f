use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cli::EditArgs;
use crate::headers::load_header_records;
use crate::hierarchy::{HierarchyTree, NodeIndex, ROOT};
use crate::model::HeaderRecord;
use crate::settings::Limits;
use crate::util::{write_json_pretty, write_json_stdout};

mod editor;
mod flatten;
mod ops;
mod run;
#[cfg(test)]
mod tests;

pub use editor::{EditError, HeaderList, LevelViolation};
pub use ops::EditOp;
pub use run::run;
