use super::*;

pub fn run(args: MineArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("mine-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    let db_path = default_db_path(&cache_root, args.db_path.as_ref());
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("mine_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(corpus_dir = %args.corpus_dir.display(), run_id = %run_id, "starting pattern mining");

    let files = discover_corpus_files(&args.corpus_dir)?;
    if files.is_empty() {
        warn!(corpus_dir = %args.corpus_dir.display(), "corpus directory holds no hierarchy files");
    }

    let outcome = build_pattern_database(&files, started_at.clone());

    info!(
        files_discovered = outcome.files_discovered,
        files_processed = outcome.processed.len(),
        patterns = outcome.database.len(),
        observations = outcome.observations,
        "pattern mining completed"
    );

    if args.dry_run {
        info!("dry-run requested; pattern database not written");
        return Ok(());
    }

    ensure_directory(&cache_root)?;
    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    save_pattern_database(&mut connection, &outcome.database)?;
    info!(path = %db_path.display(), patterns = outcome.database.len(), "wrote pattern database");

    if let Some(path) = &args.json_export_path {
        write_json_pretty(path, &outcome.database)?;
        info!(path = %path.display(), "exported pattern database json");
    }

    let manifest = MineRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_mine_command(&args),
        paths: MinePaths {
            cache_root: cache_root.display().to_string(),
            corpus_dir: args.corpus_dir.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: MineCounts {
            files_discovered: outcome.files_discovered,
            files_processed: outcome.processed.len(),
            files_skipped: outcome.files_discovered - outcome.processed.len(),
            patterns_total: outcome.database.len(),
            observations_total: outcome.observations,
        },
        source_hashes: outcome.processed,
        warnings: outcome.warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote mine run manifest");

    Ok(())
}

fn render_mine_command(args: &MineArgs) -> String {
    let mut command = vec![
        "sectionizer".to_string(),
        "mine".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--corpus-dir".to_string(),
        args.corpus_dir.display().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.json_export_path {
        command.push("--json-export-path".to_string());
        command.push(path.display().to_string());
    }
    if args.dry_run {
        command.push("--dry-run".to_string());
    }

    command.join(" ")
}
