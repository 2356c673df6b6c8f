use super::*;

const FULL_CONFIDENCE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAnnotation {
    pub is_hallucinated: bool,
    pub is_uncertain: bool,
    pub confidence: u8,
    pub note: Option<String>,
}

impl Default for NodeAnnotation {
    fn default() -> Self {
        Self {
            is_hallucinated: false,
            is_uncertain: false,
            confidence: FULL_CONFIDENCE,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub hallucinated_items: Vec<String>,
    pub omitted_whitelist_items: Vec<String>,
    pub uncertain_items: Vec<String>,
    pub overall_confidence: f64,
    pub node_count: usize,
    pub whitelist_count: usize,
    pub summary: String,
    /// Indexed by node index; slot 0 (the root) is never flagged.
    #[serde(skip)]
    pub annotations: Vec<NodeAnnotation>,
}

/// Checks a candidate tree against the document's whitelist.
///
/// Nodes may omit whitelist headers but may not invent text: every node whose
/// text is not exactly a whitelist text is flagged as hallucinated (and kept).
/// Node confidence comes from the node itself, then from `scorer`, then
/// defaults to 100; nodes below `uncertainty_threshold` are flagged uncertain.
/// The tree is not modified; see [`apply_annotations`].
pub fn validate_candidate(
    tree: &HierarchyTree,
    whitelist: &[WhitelistEntry],
    scorer: Option<&dyn NodeScorer>,
    uncertainty_threshold: u8,
) -> Result<ValidationReport> {
    if tree.is_empty() {
        bail!("candidate hierarchy has no nodes below the root");
    }

    let whitelist_texts: HashSet<&str> = whitelist
        .iter()
        .map(|entry| entry.display_text.as_str())
        .collect();

    let mut annotations = vec![NodeAnnotation::default(); tree.len() + 1];
    let mut node_texts = HashSet::new();
    let mut hallucinated_items = Vec::new();
    let mut uncertain_items = Vec::new();
    let mut confidence_sum = 0_u64;

    let order = tree.preorder();
    for &index in &order {
        let node = tree.node(index);
        let annotation = &mut annotations[index];
        node_texts.insert(node.display_text.as_str());

        if !whitelist_texts.contains(node.display_text.as_str()) {
            annotation.is_hallucinated = true;
            annotation.note = Some(format!(
                "text not found among the {} headers extracted from the document",
                whitelist.len()
            ));
            if !hallucinated_items.contains(&node.display_text) {
                hallucinated_items.push(node.display_text.clone());
            }
        }

        let confidence = node
            .confidence
            .or_else(|| scorer.and_then(|scorer| scorer.score(tree, index)))
            .unwrap_or(FULL_CONFIDENCE)
            .min(FULL_CONFIDENCE);
        annotation.confidence = confidence;
        confidence_sum += u64::from(confidence);

        if confidence < uncertainty_threshold {
            annotation.is_uncertain = true;
            uncertain_items.push(node.display_text.clone());
        }
    }

    let mut omitted_whitelist_items: Vec<String> = Vec::new();
    for entry in whitelist {
        if !node_texts.contains(entry.display_text.as_str())
            && !omitted_whitelist_items.contains(&entry.display_text)
        {
            omitted_whitelist_items.push(entry.display_text.clone());
        }
    }

    let overall_confidence = confidence_sum as f64 / order.len() as f64;
    let is_valid = hallucinated_items.is_empty();
    let summary = format!(
        "{} nodes checked against {} headers: {} hallucinated, {} omitted, {} uncertain; overall confidence {:.1}",
        order.len(),
        whitelist.len(),
        hallucinated_items.len(),
        omitted_whitelist_items.len(),
        uncertain_items.len(),
        overall_confidence
    );

    Ok(ValidationReport {
        is_valid,
        hallucinated_items,
        omitted_whitelist_items,
        uncertain_items,
        overall_confidence,
        node_count: order.len(),
        whitelist_count: whitelist.len(),
        summary,
        annotations,
    })
}

/// Copy of `tree` carrying the report's flags, notes, and confidences.
pub fn apply_annotations(tree: &HierarchyTree, report: &ValidationReport) -> HierarchyTree {
    let mut annotated = tree.clone();
    for index in tree.preorder() {
        let Some(annotation) = report.annotations.get(index) else {
            continue;
        };
        let node = annotated.node_mut(index);
        node.is_hallucinated = annotation.is_hallucinated;
        node.is_uncertain = annotation.is_uncertain;
        node.confidence = Some(annotation.confidence);
        if annotation.note.is_some() {
            node.note = annotation.note.clone();
        }
    }
    annotated
}
