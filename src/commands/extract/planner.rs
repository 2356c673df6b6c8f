use super::*;

/// Where one hierarchy node's section starts and, if known, ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub order: usize,
    pub node_index: NodeIndex,
    pub node_id: String,
    pub title: String,
    pub start: NodeId,
    pub start_position: String,
    /// Start header of the next section, or `None` for the natural boundary.
    pub end: Option<NodeId>,
    pub end_position: Option<String>,
    pub is_exact_match: bool,
    pub is_duplicate: bool,
    pub duplicate_count: usize,
}

/// One plan per bound hierarchy node, in hierarchy order.
///
/// A node's section ends at the header bound to the first later node outside
/// its own subtree. When that node is unbound (or there is none) the section
/// falls back to the natural boundary.
pub fn plan_sections(tree: &HierarchyTree, report: &MatchReport) -> Vec<SectionPlan> {
    let primary = report.primary_bindings();
    let order = tree.preorder();
    let mut plans = Vec::new();

    for (position, &index) in order.iter().enumerate() {
        let Some(found) = primary.get(&index) else {
            continue;
        };
        let Some(header) = &found.header else {
            continue;
        };

        let next = order[position + 1..]
            .iter()
            .copied()
            .find(|&later| !tree.is_descendant(later, index));
        let end_header = next
            .and_then(|later| primary.get(&later))
            .and_then(|bound| bound.header.as_ref());

        plans.push(SectionPlan {
            order: plans.len() + 1,
            node_index: index,
            node_id: found.hierarchy_node_id.clone(),
            title: found.node_text.clone(),
            start: header.node,
            start_position: header.position_path.clone(),
            end: end_header.map(|bound| bound.node),
            end_position: end_header.map(|bound| bound.position_path.clone()),
            is_exact_match: found.is_exact_match,
            is_duplicate: found.is_duplicate,
            duplicate_count: found.duplicate_count,
        });
    }

    plans
}
