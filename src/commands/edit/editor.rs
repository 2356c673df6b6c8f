use super::*;

/// Rejection of an edit. Nothing is modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no header with id `{id}`")]
    UnknownHeader { id: String },

    #[error("`{text}` ({id}) is excluded; include it before moving it")]
    Excluded { id: String, text: String },

    #[error("`{text}` ({id}) is already at the maximum indent level {max_level}")]
    AtMaximumDepth {
        id: String,
        text: String,
        max_level: usize,
    },

    #[error("`{text}` ({id}) has no preceding included header to nest under")]
    NoPredecessor { id: String, text: String },

    #[error(
        "indenting `{text}` ({id}) to level {level} would leave a gap under the preceding header at level {previous_level}"
    )]
    Gap {
        id: String,
        text: String,
        level: usize,
        previous_level: usize,
    },

    #[error(
        "indenting `{text}` ({id}) would push its child `{child_text}` ({child_id}) past the maximum indent level {max_level}"
    )]
    ChildTooDeep {
        id: String,
        text: String,
        child_id: String,
        child_text: String,
        max_level: usize,
    },

    #[error("`{text}` ({id}) is already at the top level")]
    AtTopLevel { id: String, text: String },
}

/// A record whose indent level breaks the no-gap or maximum-depth rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelViolation {
    pub id: String,
    pub indent_level: usize,
    pub allowed_max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Indent,
    Outdent,
}

/// Flat, document-ordered header list under manual editing.
///
/// Every operation validates the whole selection against a working copy and
/// only replaces the list once all selected records have passed, so a
/// rejected operation leaves the list exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderList {
    records: Vec<HeaderRecord>,
    pub(super) limits: Limits,
}

impl HeaderList {
    pub fn new(records: Vec<HeaderRecord>, limits: Limits) -> Self {
        Self { records, limits }
    }

    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<HeaderRecord> {
        self.records
    }

    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        match op {
            EditOp::Indent(ids) => self.indent(ids),
            EditOp::Outdent(ids) => self.outdent(ids),
            EditOp::Exclude(ids) => self.exclude(ids),
            EditOp::Include(ids) => self.include(ids),
            EditOp::Reset => {
                self.reset_all();
                Ok(())
            }
        }
    }

    /// Moves each selected record, together with its structural children,
    /// one level deeper.
    pub fn indent<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), EditError> {
        self.shift(ids, Shift::Indent)
    }

    /// Moves each selected record, together with its structural children,
    /// one level shallower.
    pub fn outdent<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), EditError> {
        self.shift(ids, Shift::Outdent)
    }

    pub fn exclude<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), EditError> {
        self.set_excluded(ids, true)
    }

    pub fn include<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), EditError> {
        self.set_excluded(ids, false)
    }

    pub fn reset_all(&mut self) {
        for record in &mut self.records {
            record.indent_level = 0;
            record.is_excluded = false;
        }
    }

    /// Included records whose level exceeds the preceding included record's
    /// level plus one, or the maximum indent level.
    pub fn violations(&self) -> Vec<LevelViolation> {
        let max_level = self.limits.max_indent_level();
        let mut violations = Vec::new();
        let mut previous: Option<usize> = None;

        for record in self.records.iter().filter(|record| !record.is_excluded) {
            let allowed_max = previous.map_or(0, |level| (level + 1).min(max_level));
            if record.indent_level > allowed_max {
                violations.push(LevelViolation {
                    id: record.id.clone(),
                    indent_level: record.indent_level,
                    allowed_max,
                });
            }
            previous = Some(record.indent_level);
        }

        violations
    }

    fn position(&self, id: &str) -> Result<usize, EditError> {
        self.records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| EditError::UnknownHeader { id: id.to_string() })
    }

    fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<usize>, EditError> {
        let mut positions = ids
            .iter()
            .map(|id| self.position(id.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        positions.sort_unstable();
        positions.dedup();
        Ok(positions)
    }

    fn set_excluded<S: AsRef<str>>(&mut self, ids: &[S], excluded: bool) -> Result<(), EditError> {
        for position in self.resolve(ids)? {
            self.records[position].is_excluded = excluded;
        }
        Ok(())
    }

    fn shift<S: AsRef<str>>(&mut self, ids: &[S], shift: Shift) -> Result<(), EditError> {
        let selected = self.resolve(ids)?;
        let mut working = self.records.clone();

        // a selected record inside another selected record's subtree moves with it
        let mut moved: HashSet<usize> = HashSet::new();
        for position in selected {
            if moved.contains(&position) {
                continue;
            }

            let children = structural_children(&working, position);
            match shift {
                Shift::Indent => check_indent(&working, position, &children, &self.limits)?,
                Shift::Outdent => check_outdent(&working, position)?,
            }

            for &index in std::iter::once(&position).chain(children.iter()) {
                let level = &mut working[index].indent_level;
                *level = match shift {
                    Shift::Indent => *level + 1,
                    Shift::Outdent => *level - 1,
                };
                moved.insert(index);
            }
        }

        self.records = working;
        Ok(())
    }
}

/// Following included records nested deeper than `position`, up to the next
/// included record at the same level or shallower. Excluded records are
/// skipped and never move.
fn structural_children(records: &[HeaderRecord], position: usize) -> Vec<usize> {
    let level = records[position].indent_level;
    records
        .iter()
        .enumerate()
        .skip(position + 1)
        .filter(|(_, record)| !record.is_excluded)
        .take_while(|(_, record)| record.indent_level > level)
        .map(|(index, _)| index)
        .collect()
}

fn previous_included(records: &[HeaderRecord], position: usize) -> Option<&HeaderRecord> {
    records[..position]
        .iter()
        .rev()
        .find(|record| !record.is_excluded)
}

fn check_indent(
    records: &[HeaderRecord],
    position: usize,
    children: &[usize],
    limits: &Limits,
) -> Result<(), EditError> {
    let record = &records[position];
    let max_level = limits.max_indent_level();

    if record.is_excluded {
        return Err(EditError::Excluded {
            id: record.id.clone(),
            text: record.display_text.clone(),
        });
    }
    if record.indent_level >= max_level {
        return Err(EditError::AtMaximumDepth {
            id: record.id.clone(),
            text: record.display_text.clone(),
            max_level,
        });
    }

    let Some(previous) = previous_included(records, position) else {
        return Err(EditError::NoPredecessor {
            id: record.id.clone(),
            text: record.display_text.clone(),
        });
    };

    let level = record.indent_level + 1;
    if level > previous.indent_level + 1 {
        return Err(EditError::Gap {
            id: record.id.clone(),
            text: record.display_text.clone(),
            level,
            previous_level: previous.indent_level,
        });
    }

    if let Some(&child) = children
        .iter()
        .find(|&&child| records[child].indent_level >= max_level)
    {
        return Err(EditError::ChildTooDeep {
            id: record.id.clone(),
            text: record.display_text.clone(),
            child_id: records[child].id.clone(),
            child_text: records[child].display_text.clone(),
            max_level,
        });
    }

    Ok(())
}

fn check_outdent(records: &[HeaderRecord], position: usize) -> Result<(), EditError> {
    let record = &records[position];

    if record.is_excluded {
        return Err(EditError::Excluded {
            id: record.id.clone(),
            text: record.display_text.clone(),
        });
    }
    if record.indent_level == 0 {
        return Err(EditError::AtTopLevel {
            id: record.id.clone(),
            text: record.display_text.clone(),
        });
    }

    Ok(())
}
