use super::*;

pub fn run(args: MatchArgs) -> Result<()> {
    let limits = args.limits.limits();

    let input: HierarchyInput = read_json(&args.hierarchy)?;
    let tree = HierarchyTree::from_item(&input.into_root(), limits.max_depth)?;
    let doc = document::parse_file(&args.document)?;
    let headers = doc.headers();

    info!(
        nodes = tree.len(),
        headers = headers.len(),
        fuzzy_threshold = limits.fuzzy_threshold,
        "matching hierarchy against document headers"
    );

    let report = match_headers(&tree, &headers, limits.fuzzy_threshold);

    for text in &report.unmatched {
        warn!(text = %text, "hierarchy node has no matching document header");
    }
    for found in report.matches.iter().filter(|found| found.is_duplicate) {
        if found.duplicate_index == 0 {
            warn!(
                text = %found.node_text,
                candidates = found.duplicate_count,
                "hierarchy node matches several headers; first one used"
            );
        }
    }
    for found in locator_mismatches(&tree, &doc, &report) {
        warn!(
            text = %found.node_text,
            locator = %tree.node(found.node_index).position_path.as_deref().unwrap_or_default(),
            "stored locator points at a different element than the matched header"
        );
    }
    info!(
        exact = report.stats.exact_nodes,
        fuzzy = report.stats.fuzzy_nodes,
        unmatched = report.stats.unmatched_nodes,
        duplicates = report.stats.duplicate_nodes,
        "header matching completed"
    );

    if args.json {
        return write_json_stdout(&report);
    }

    for found in &report.matches {
        match &found.header {
            Some(header) => {
                let kind = if found.is_exact_match { "exact" } else { "fuzzy" };
                let duplicate = if found.is_duplicate {
                    format!(" [{}/{}]", found.duplicate_index + 1, found.duplicate_count)
                } else {
                    String::new()
                };
                println!(
                    "{kind} {:.3} {} -> {} ({}){duplicate}",
                    found.confidence_score, found.node_text, header.position_path, header.text
                );
            }
            None => println!("unmatched {}", found.node_text),
        }
    }

    Ok(())
}
