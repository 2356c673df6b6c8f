use super::*;

#[derive(Debug, Clone)]
pub struct ExtractedSection {
    pub document: Document,
    /// Top-level elements copied from the source, the start header included.
    pub element_count: usize,
    /// Where the section stopped in the source, if before the container end.
    pub boundary: Option<NodeId>,
    pub is_empty: bool,
}

/// Copies the content between `start` and its boundary into a new standalone
/// document titled `title`. The source document is not modified.
///
/// With an explicit `end` the section stops right before it. Without one it
/// stops at the next header whose depth is less than or equal to the start's.
/// Only nodes whose parent is the body container or the start header's parent
/// are copied, each with its whole subtree; a container that holds the
/// boundary ends the section before it.
pub fn extract_section(
    doc: &Document,
    start: NodeId,
    end: Option<NodeId>,
    title: &str,
) -> Result<ExtractedSection> {
    let Some(start_depth) = doc.heading_depth(start) else {
        bail!(
            "section start {} is not a header element",
            doc.position_path(start)
        );
    };
    let container = doc
        .find_ancestor_element(start, "body")
        .or_else(|| doc.document_element())
        .context("document has no root element")?;
    let start_parent = doc.parent(start);

    let walk = doc.descendants(container);
    let Some(start_at) = walk.iter().position(|&id| id == start) else {
        bail!(
            "section start {} is outside its container",
            doc.position_path(start)
        );
    };
    // first node after the start header's own subtree
    let after_start = start_at + doc.subtree(start).len();
    let following = walk.get(after_start..).unwrap_or_default();

    let explicit = end.filter(|end| following.contains(end));
    if let (Some(end), None) = (end, explicit) {
        warn!(
            start = %doc.position_path(start),
            end = %doc.position_path(end),
            "explicit end does not follow the start header; using the natural boundary"
        );
    }
    let boundary = match explicit {
        Some(end) => Some(end),
        None => following.iter().copied().find(|&id| {
            doc.heading_depth(id)
                .is_some_and(|depth| depth <= start_depth)
        }),
    };

    let mut collected = vec![start];
    let mut consumed: HashSet<NodeId> = HashSet::new();
    for &id in following {
        if Some(id) == boundary {
            break;
        }
        if consumed.contains(&id) {
            continue;
        }

        let parent = doc.parent(id);
        let collectable = parent == Some(container)
            || parent == start_parent
            || is_inside_sibling(doc, id, start, start_parent);
        if !collectable {
            continue;
        }
        if boundary.is_some_and(|boundary| doc.is_ancestor(id, boundary)) {
            break;
        }

        collected.push(id);
        consumed.extend(doc.subtree(id));
    }

    let (mut section, body) = Document::standalone(title);
    for &id in &collected {
        section.import_subtree(body, doc, id);
    }

    let is_empty = collected
        .iter()
        .skip(1)
        .all(|&id| is_blank(doc, id));
    if is_empty {
        warn!(
            start = %doc.position_path(start),
            title = %title,
            "section holds nothing beyond its header"
        );
    }

    Ok(ExtractedSection {
        document: section,
        element_count: collected.iter().filter(|&&id| doc.is_element(id)).count(),
        boundary,
        is_empty,
    })
}

/// True when `id` sits below a sibling of the start header.
fn is_inside_sibling(
    doc: &Document,
    id: NodeId,
    start: NodeId,
    start_parent: Option<NodeId>,
) -> bool {
    let Some(start_parent) = start_parent else {
        return false;
    };
    let mut current = doc.parent(id);
    while let Some(node) = current {
        if node == start {
            return false;
        }
        if doc.parent(node) == Some(start_parent) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

fn is_blank(doc: &Document, id: NodeId) -> bool {
    !doc.is_element(id) && doc.text_content(id).trim().is_empty()
}
