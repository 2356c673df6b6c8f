use super::*;

pub fn run(args: EditArgs) -> Result<()> {
    let limits = args.limits.limits();
    let records = load_header_records(&args.headers)?;
    info!(
        headers = records.len(),
        ops = args.ops.len(),
        path = %args.headers.display(),
        "starting manual hierarchy edit"
    );

    let mut list = HeaderList::new(records, limits);
    for raw in &args.ops {
        let op: EditOp = raw.parse()?;
        list.apply(&op)
            .with_context(|| format!("edit operation `{raw}` rejected"))?;
        info!(op = %raw, "applied edit operation");
    }

    for violation in list.violations() {
        warn!(
            id = %violation.id,
            indent_level = violation.indent_level,
            allowed_max = violation.allowed_max,
            "header list breaks the indent rules"
        );
    }

    let tree = list.flatten_to_tree()?;
    let hierarchy = tree.to_item();
    info!(nodes = tree.len(), "flattened header list into hierarchy");

    if let Some(path) = &args.headers_out {
        let mut records = list.into_records();
        for record in &mut records {
            record.is_used = !record.is_excluded;
        }
        write_json_pretty(path, &records)?;
        info!(path = %path.display(), "wrote edited header list");
    }

    if let Some(path) = &args.hierarchy_out {
        write_json_pretty(path, &hierarchy)?;
        info!(path = %path.display(), "wrote hierarchy");
    }

    if args.json {
        write_json_stdout(&hierarchy)?;
    } else {
        for index in tree.preorder() {
            let node = tree.node(index);
            println!("{}{}", "  ".repeat(node.depth - 1), node.display_text);
        }
    }

    Ok(())
}
