use super::*;

/// Returns the matches with duplicate information filled in. Nodes bound to
/// more than one header get `is_duplicate`, the group size, and an index in
/// discovery order; the input is left as it was.
pub fn tag_duplicates(matches: &[HeaderMatch]) -> Vec<HeaderMatch> {
    let mut group_sizes: HashMap<NodeIndex, usize> = HashMap::new();
    for found in matches.iter().filter(|found| found.is_matched()) {
        *group_sizes.entry(found.node_index).or_default() += 1;
    }

    let mut seen: HashMap<NodeIndex, usize> = HashMap::new();
    matches
        .iter()
        .map(|found| {
            if !found.is_matched() {
                return HeaderMatch {
                    is_duplicate: false,
                    duplicate_count: 0,
                    duplicate_index: 0,
                    ..found.clone()
                };
            }

            let count = group_sizes.get(&found.node_index).copied().unwrap_or(1);
            let slot = seen.entry(found.node_index).or_default();
            let duplicate_index = *slot;
            *slot += 1;

            HeaderMatch {
                is_duplicate: count > 1,
                duplicate_count: count,
                duplicate_index,
                ..found.clone()
            }
        })
        .collect()
}
