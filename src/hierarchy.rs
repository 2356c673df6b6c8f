//! Arena-backed hierarchy tree.
//!
//! Every node is owned by the tree's node table and referenced by index, so a
//! node has exactly one parent and cycles cannot be expressed. Index 0 is the
//! synthetic root at depth 0; first-level nodes sit at depth 1. Traversals use
//! explicit work stacks so arbitrarily deep inputs never grow the call stack.

use anyhow::{Result, bail};
use tracing::warn;

use crate::model::HierarchyItem;

pub type NodeIndex = usize;

pub const ROOT: NodeIndex = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub id: String,
    pub display_text: String,
    pub depth: usize,
    pub position_path: Option<String>,
    /// Confidence carried in from the source of the tree (0-100).
    pub confidence: Option<u8>,
    pub is_uncertain: bool,
    pub is_hallucinated: bool,
    pub note: Option<String>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl HierarchyNode {
    fn new(id: String, display_text: String, depth: usize, parent: Option<NodeIndex>) -> Self {
        Self {
            id,
            display_text,
            depth,
            position_path: None,
            confidence: None,
            is_uncertain: false,
            is_hallucinated: false,
            note: None,
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyTree {
    nodes: Vec<HierarchyNode>,
    max_depth: usize,
}

impl HierarchyTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            nodes: vec![HierarchyNode::new(
                "root".to_string(),
                String::new(),
                0,
                None,
            )],
            max_depth,
        }
    }

    /// Appends a node as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        id: impl Into<String>,
        display_text: impl Into<String>,
    ) -> Result<NodeIndex> {
        let Some(parent_node) = self.nodes.get(parent) else {
            bail!("unknown parent node index {parent}");
        };

        let depth = parent_node.depth + 1;
        if depth > self.max_depth {
            bail!(
                "node would sit at depth {depth}, beyond the maximum nesting depth {}",
                self.max_depth
            );
        }

        let index = self.nodes.len();
        let mut id = id.into();
        if id.is_empty() {
            id = format!("node-{index}");
        }

        self.nodes
            .push(HierarchyNode::new(id, display_text.into(), depth, Some(parent)));
        self.nodes[parent].children.push(index);
        Ok(index)
    }

    pub fn node(&self, index: NodeIndex) -> &HierarchyNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut HierarchyNode {
        &mut self.nodes[index]
    }

    #[cfg(test)]
    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes[index].parent
    }

    #[cfg(test)]
    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.nodes[index].children
    }

    /// Number of nodes, not counting the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-root nodes in document (pre-)order.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = self.preorder_from(ROOT);
        order.remove(0);
        order
    }

    fn preorder_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];

        while let Some(index) = stack.pop() {
            order.push(index);
            for &child in self.nodes[index].children.iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    pub fn is_descendant(&self, node: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut current = self.nodes[node].parent;
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.nodes[index].parent;
        }
        false
    }

    /// Display text of the parent, or `None` for first-level nodes.
    pub fn parent_text(&self, index: NodeIndex) -> Option<&str> {
        match self.nodes[index].parent {
            Some(ROOT) | None => None,
            Some(parent) => Some(self.nodes[parent].display_text.as_str()),
        }
    }

    /// Builds the arena from the exchange format. Depth is taken from the
    /// structure; a declared `level` that disagrees is logged and ignored.
    pub fn from_item(root: &HierarchyItem, max_depth: usize) -> Result<Self> {
        let mut tree = Self::new(max_depth);
        if !root.id.is_empty() {
            tree.nodes[ROOT].id = root.id.clone();
        }
        tree.nodes[ROOT].display_text = root.display_text.clone();

        let mut level_mismatches = 0_usize;
        let mut stack: Vec<(&HierarchyItem, NodeIndex)> =
            root.sub_items.iter().rev().map(|item| (item, ROOT)).collect();

        while let Some((item, parent)) = stack.pop() {
            let index = tree.add_child(parent, item.id.clone(), item.display_text.clone())?;
            let node = &mut tree.nodes[index];
            node.position_path = item.position_path.clone();
            node.confidence = item.confidence.map(|value| value.min(100));
            node.is_uncertain = item.is_uncertain;
            node.is_hallucinated = item.is_hallucinated;
            node.note = item.note.clone();

            if item.level != 0 && item.level as usize != node.depth {
                level_mismatches += 1;
            }

            for child in item.sub_items.iter().rev() {
                stack.push((child, index));
            }
        }

        if level_mismatches > 0 {
            warn!(
                count = level_mismatches,
                "declared item levels disagree with tree structure; structural depth used"
            );
        }

        Ok(tree)
    }

    /// Converts back into the nested exchange format.
    pub fn to_item(&self) -> HierarchyItem {
        let order = self.preorder_from(ROOT);
        let mut built: Vec<Option<HierarchyItem>> = vec![None; self.nodes.len()];

        for &index in order.iter().rev() {
            let node = &self.nodes[index];
            let sub_items = node
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();

            built[index] = Some(HierarchyItem {
                id: node.id.clone(),
                display_text: node.display_text.clone(),
                level: node.depth as u32,
                position_path: node.position_path.clone(),
                confidence: node.confidence,
                is_uncertain: node.is_uncertain,
                is_hallucinated: node.is_hallucinated,
                note: node.note.clone(),
                sub_items,
            });
        }

        built[ROOT]
            .take()
            .unwrap_or_else(|| HierarchyItem::new("root", "", 0))
    }
}
