use super::*;

const SLUG_MAX_LEN: usize = 60;

pub fn run(args: ExtractArgs) -> Result<()> {
    let limits = args.limits.limits();

    let input: HierarchyInput = read_json(&args.hierarchy)?;
    let tree = HierarchyTree::from_item(&input.into_root(), limits.max_depth)?;
    let doc = document::parse_file(&args.document)?;
    let headers = doc.headers();

    info!(
        nodes = tree.len(),
        headers = headers.len(),
        document = %args.document.display(),
        "starting section extraction"
    );

    let report = match_headers(&tree, &headers, limits.fuzzy_threshold);
    let mut warnings: Vec<String> = Vec::new();
    for text in &report.unmatched {
        warn!(text = %text, "hierarchy node has no matching document header; no section written");
        warnings.push(format!("unmatched node: {text}"));
    }

    for found in locator_mismatches(&tree, &doc, &report) {
        warn!(text = %found.node_text, "stored locator disagrees with the matched header");
        warnings.push(format!("locator mismatch: {}", found.node_text));
    }

    let plans = plan_sections(&tree, &report);
    ensure_directory(&args.output_dir)?;

    let mut sections = Vec::with_capacity(plans.len());
    for plan in &plans {
        if plan.is_duplicate {
            warnings.push(format!(
                "{} matched {} headers; used {}",
                plan.title, plan.duplicate_count, plan.start_position
            ));
        }

        let extracted = extract_section(&doc, plan.start, plan.end, &plan.title)
            .with_context(|| format!("failed to extract section {}", plan.title))?;
        if extracted.is_empty {
            warnings.push(format!("empty section: {}", plan.title));
        }

        let (fragment, depth_shift) = if args.skip_normalize {
            (Cow::Borrowed(&extracted.document), 0)
        } else {
            normalize_header_depths(&extracted.document)
        };

        let file = format!("{:03}_{}.xhtml", plan.order, slugify(&plan.title, SLUG_MAX_LEN));
        write_text(&args.output_dir.join(&file), &fragment.serialize())?;

        sections.push(SectionManifestEntry {
            order: plan.order,
            node_id: plan.node_id.clone(),
            title: plan.title.clone(),
            file,
            start_position: plan.start_position.clone(),
            end_position: plan.end_position.clone(),
            element_count: extracted.element_count,
            is_empty: extracted.is_empty,
            is_exact_match: plan.is_exact_match,
            is_duplicate: plan.is_duplicate,
            duplicate_count: plan.duplicate_count,
            depth_shift,
        });
    }

    let manifest = SectionManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        document: args.document.display().to_string(),
        document_sha256: sha256_file(&args.document)?,
        hierarchy: args.hierarchy.display().to_string(),
        section_count: sections.len(),
        unmatched_nodes: report.unmatched.clone(),
        sections,
        warnings,
    };

    let manifest_path = args.output_dir.join("sections.json");
    write_json_pretty(&manifest_path, &manifest)?;
    info!(
        sections = manifest.section_count,
        unmatched = manifest.unmatched_nodes.len(),
        warnings = manifest.warnings.len(),
        path = %manifest_path.display(),
        "section extraction completed"
    );

    Ok(())
}
