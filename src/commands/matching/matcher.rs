use super::*;

const SIMILARITY_EPSILON: f64 = 1e-9;

/// The document header a hierarchy node is bound to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedHeader {
    /// Position in the document's header list.
    pub header_index: usize,
    #[serde(skip)]
    pub node: NodeId,
    pub text: String,
    pub depth: u8,
    pub position_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderMatch {
    pub hierarchy_node_id: String,
    #[serde(skip)]
    pub node_index: NodeIndex,
    pub node_text: String,
    /// `None` when nothing met the fuzzy threshold.
    pub header: Option<MatchedHeader>,
    pub is_exact_match: bool,
    pub confidence_score: f64,
    pub is_duplicate: bool,
    pub duplicate_count: usize,
    pub duplicate_index: usize,
}

impl HeaderMatch {
    fn unmatched(tree: &HierarchyTree, node_index: NodeIndex) -> Self {
        let node = tree.node(node_index);
        Self {
            hierarchy_node_id: node.id.clone(),
            node_index,
            node_text: node.display_text.clone(),
            header: None,
            is_exact_match: false,
            confidence_score: 0.0,
            is_duplicate: false,
            duplicate_count: 0,
            duplicate_index: 0,
        }
    }

    fn bound(
        tree: &HierarchyTree,
        node_index: NodeIndex,
        headers: &[DocumentHeader],
        header_index: usize,
        is_exact_match: bool,
        confidence_score: f64,
    ) -> Self {
        let header = &headers[header_index];
        Self {
            header: Some(MatchedHeader {
                header_index,
                node: header.node,
                text: header.text.clone(),
                depth: header.depth,
                position_path: header.position_path.clone(),
            }),
            is_exact_match,
            confidence_score,
            ..Self::unmatched(tree, node_index)
        }
    }

    pub fn is_matched(&self) -> bool {
        self.header.is_some()
    }

    /// Default binding of the node: the first (or only) candidate header.
    pub fn is_primary(&self) -> bool {
        self.is_matched() && self.duplicate_index == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchStats {
    pub hierarchy_nodes: usize,
    pub document_headers: usize,
    pub exact_nodes: usize,
    pub fuzzy_nodes: usize,
    pub unmatched_nodes: usize,
    pub duplicate_nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub stats: MatchStats,
    /// Node texts that could not be bound, in hierarchy order.
    pub unmatched: Vec<String>,
    pub matches: Vec<HeaderMatch>,
}

impl MatchReport {
    /// Primary binding per hierarchy node.
    pub fn primary_bindings(&self) -> HashMap<NodeIndex, &HeaderMatch> {
        self.matches
            .iter()
            .filter(|found| found.is_primary())
            .map(|found| (found.node_index, found))
            .collect()
    }
}

/// Primary bindings of nodes whose stored locator resolves to another element
/// of `doc` than the header their text was bound to. Locators that no longer
/// resolve are ignored.
pub fn locator_mismatches<'a>(
    tree: &HierarchyTree,
    doc: &Document,
    report: &'a MatchReport,
) -> Vec<&'a HeaderMatch> {
    report
        .matches
        .iter()
        .filter(|found| found.is_primary())
        .filter(|found| {
            let Some(header) = &found.header else {
                return false;
            };
            tree.node(found.node_index)
                .position_path
                .as_deref()
                .and_then(|path| doc.resolve_position_path(path))
                .is_some_and(|located| located != header.node)
        })
        .collect()
}

/// Normalized edit-distance similarity in `[0, 1]` of two header texts,
/// compared case- and whitespace-insensitively.
#[cfg(test)]
pub fn similarity(left: &str, right: &str) -> f64 {
    normalized_levenshtein(&match_key(left), &match_key(right))
}

enum Binding {
    Exact(Vec<usize>),
    Fuzzy(Vec<(usize, f64)>),
    Unmatched,
}

/// Binds every hierarchy node to the document headers carrying its text.
///
/// The exact pass finds every header whose normalized text equals the node's.
/// Once all exact results are in, nodes without one are compared against the
/// headers no exact match claimed; all headers tied at the best similarity at
/// or above `fuzzy_threshold` are kept. Multiple candidates for one node are
/// tagged as duplicates.
pub fn match_headers(
    tree: &HierarchyTree,
    headers: &[DocumentHeader],
    fuzzy_threshold: f64,
) -> MatchReport {
    let nodes = tree.preorder();
    let header_keys: Vec<String> = headers.iter().map(|header| match_key(&header.text)).collect();

    let exact: Vec<Vec<usize>> = nodes
        .par_iter()
        .map(|&index| {
            let key = match_key(&tree.node(index).display_text);
            header_keys
                .iter()
                .enumerate()
                .filter(|(_, header_key)| **header_key == key)
                .map(|(position, _)| position)
                .collect()
        })
        .collect();

    let claimed: HashSet<usize> = exact.iter().flatten().copied().collect();
    let open_headers: Vec<usize> = (0..headers.len())
        .filter(|position| !claimed.contains(position))
        .collect();

    let bindings: Vec<Binding> = nodes
        .par_iter()
        .zip(exact.into_par_iter())
        .map(|(&index, exact)| {
            if !exact.is_empty() {
                return Binding::Exact(exact);
            }
            let candidates = best_fuzzy_candidates(
                &match_key(&tree.node(index).display_text),
                &open_headers,
                &header_keys,
                fuzzy_threshold,
            );
            if candidates.is_empty() {
                Binding::Unmatched
            } else {
                Binding::Fuzzy(candidates)
            }
        })
        .collect();

    let mut stats = MatchStats {
        hierarchy_nodes: nodes.len(),
        document_headers: headers.len(),
        ..MatchStats::default()
    };
    let mut unmatched = Vec::new();
    let mut matches = Vec::with_capacity(nodes.len());

    for (&index, binding) in nodes.iter().zip(bindings) {
        match binding {
            Binding::Exact(found) => {
                stats.exact_nodes += 1;
                for position in found {
                    matches.push(HeaderMatch::bound(tree, index, headers, position, true, 1.0));
                }
            }
            Binding::Fuzzy(found) => {
                stats.fuzzy_nodes += 1;
                for (position, score) in found {
                    matches.push(HeaderMatch::bound(tree, index, headers, position, false, score));
                }
            }
            Binding::Unmatched => {
                stats.unmatched_nodes += 1;
                unmatched.push(tree.node(index).display_text.clone());
                matches.push(HeaderMatch::unmatched(tree, index));
            }
        }
    }

    let matches = tag_duplicates(&matches);
    stats.duplicate_nodes = matches
        .iter()
        .filter(|found| found.is_duplicate && found.duplicate_index == 0)
        .count();

    MatchReport {
        stats,
        unmatched,
        matches,
    }
}

fn best_fuzzy_candidates(
    key: &str,
    open_headers: &[usize],
    header_keys: &[String],
    threshold: f64,
) -> Vec<(usize, f64)> {
    let scored: Vec<(usize, f64)> = open_headers
        .iter()
        .map(|&position| (position, normalized_levenshtein(key, &header_keys[position])))
        .filter(|(_, score)| *score + SIMILARITY_EPSILON >= threshold)
        .collect();

    let Some(best) = scored.iter().map(|(_, score)| *score).reduce(f64::max) else {
        return Vec::new();
    };

    scored
        .into_iter()
        .filter(|(_, score)| (best - *score).abs() <= SIMILARITY_EPSILON)
        .collect()
}
