use super::*;

impl HeaderList {
    /// Converts the included records into a hierarchy, preserving document
    /// order. A record is nested under the most recent record one level
    /// shallower; a record with no such ancestor is attached to the root and
    /// logged. Records nested beyond the depth limit are lifted to the deepest
    /// allowed level.
    pub fn flatten_to_tree(&self) -> Result<HierarchyTree> {
        let mut tree = HierarchyTree::new(self.limits.max_depth);
        // (indent level, node) along the most recently emitted path
        let mut stack: Vec<(usize, NodeIndex)> = Vec::new();
        let mut orphans = 0_usize;
        let deepest_level = self.limits.max_indent_level();

        for record in self.records().iter().filter(|record| !record.is_excluded) {
            let mut level = record.indent_level;
            if level > deepest_level {
                warn!(
                    id = %record.id,
                    text = %record.display_text,
                    indent_level = level,
                    placed_at = deepest_level,
                    "header is nested beyond the maximum depth; placing it at the deepest allowed level"
                );
                level = deepest_level;
            }
            while stack.last().is_some_and(|&(top, _)| top >= level) {
                stack.pop();
            }

            let parent = match stack.last() {
                _ if level == 0 => ROOT,
                Some(&(top, node)) if top + 1 == level => node,
                _ => {
                    warn!(
                        id = %record.id,
                        text = %record.display_text,
                        indent_level = level,
                        "header has no parent one level up; attaching it to the root"
                    );
                    orphans += 1;
                    // an orphan starts a new path so later records cannot nest
                    // under nodes that precede it
                    stack.clear();
                    ROOT
                }
            };

            let index = tree
                .add_child(parent, record.id.clone(), record.display_text.clone())
                .with_context(|| format!("failed to place header {}", record.id))?;
            if !record.position_path.is_empty() {
                tree.node_mut(index).position_path = Some(record.position_path.clone());
            }
            stack.push((level, index));
        }

        if orphans > 0 {
            warn!(count = orphans, "flattened header list contained orphaned levels");
        }

        Ok(tree)
    }
}
