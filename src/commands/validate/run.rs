use super::*;

pub fn run(args: ValidateArgs) -> Result<()> {
    let limits = args.limits.limits();

    let input: HierarchyInput = read_json(&args.candidate)?;
    let tree = HierarchyTree::from_item(&input.into_root(), limits.max_depth)?;
    let whitelist = load_whitelist(&args.whitelist)?;

    info!(
        candidate = %args.candidate.display(),
        nodes = tree.len(),
        whitelist = whitelist.len(),
        "validating candidate hierarchy"
    );

    let database = if args.with_patterns {
        let db_path = default_db_path(&args.cache_root, args.db_path.as_ref());
        let database = open_pattern_database(&db_path)?;
        if database.is_empty() {
            warn!(
                path = %db_path.display(),
                "pattern database is empty; node scores fall back to full confidence"
            );
        }
        Some(database)
    } else {
        None
    };
    let scorer = database.as_ref().map(|database| {
        PatternScorer::new(database).with_min_confidence(args.min_pattern_confidence)
    });

    let report = validate_candidate(
        &tree,
        &whitelist,
        scorer.as_ref().map(|scorer| scorer as &dyn NodeScorer),
        limits.uncertainty_threshold,
    )?;

    for text in &report.hallucinated_items {
        warn!(text = %text, "candidate node text not present in document");
    }
    info!(
        is_valid = report.is_valid,
        hallucinated = report.hallucinated_items.len(),
        omitted = report.omitted_whitelist_items.len(),
        uncertain = report.uncertain_items.len(),
        overall_confidence = report.overall_confidence,
        "candidate validation completed"
    );

    if let Some(path) = &args.output {
        let annotated = apply_annotations(&tree, &report);
        write_json_pretty(path, &annotated.to_item())?;
        info!(path = %path.display(), "wrote annotated hierarchy");
    }

    if args.json {
        write_json_stdout(&report)?;
    } else {
        println!("{}", report.summary);
        for text in &report.hallucinated_items {
            println!("hallucinated: {text}");
        }
        for text in &report.omitted_whitelist_items {
            println!("omitted: {text}");
        }
        for text in &report.uncertain_items {
            println!("uncertain: {text}");
        }
    }

    Ok(())
}
