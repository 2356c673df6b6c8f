use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_db_path};
use crate::patterns::open_pattern_database;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = default_db_path(&args.cache_root, args.db_path.as_ref());

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_mine_manifest(&manifest_dir) {
        Some(path) => info!(path = %path.display(), "latest mine run manifest"),
        None => warn!(path = %manifest_dir.display(), "no mine run manifest found"),
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "pattern database missing");
        return Ok(());
    }

    let database = open_pattern_database(&db_path)?;
    info!(
        path = %db_path.display(),
        corpus_size = database.corpus_size,
        built_at = %database.built_at,
        patterns = database.len(),
        "pattern database status"
    );
    if database.is_empty() {
        warn!(path = %db_path.display(), "pattern database holds no patterns");
    }

    for pattern in database.patterns.iter().take(args.top) {
        info!(
            title = %pattern.normalized_title,
            variant = %pattern.original_title_variants.first().map(String::as_str).unwrap_or_default(),
            confidence = pattern.confidence,
            occurrences = pattern.total_occurrences,
            most_common_depth = pattern.most_common_depth().unwrap_or_default(),
            likely_parent = %database
                .find_most_likely_parent(&pattern.normalized_title)
                .unwrap_or_default(),
            "pattern"
        );
    }

    Ok(())
}

fn latest_mine_manifest(manifest_dir: &std::path::Path) -> Option<std::path::PathBuf> {
    let entries = std::fs::read_dir(manifest_dir).ok()?;
    entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("mine_run_") && name.ends_with(".json"))
        })
        .max()
}
