use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::{ParentFrequency, PatternDatabase, SectionPattern};

pub const PATTERN_SCHEMA_VERSION: &str = "1";

/// Opens a built pattern database read-only and loads it into memory.
pub fn open_pattern_database(db_path: &Path) -> Result<PatternDatabase> {
    if !db_path.exists() {
        bail!(
            "pattern database not found at {}; run `sectionizer mine` first",
            db_path.display()
        );
    }

    let connection = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open {}", db_path.display()))?;

    load_pattern_database(&connection)
        .with_context(|| format!("failed to load patterns from {}", db_path.display()))
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS patterns (
              normalized_title TEXT PRIMARY KEY,
              total_occurrences INTEGER NOT NULL,
              confidence REAL NOT NULL,
              most_common_depth INTEGER
            );

            CREATE TABLE IF NOT EXISTS pattern_variants (
              normalized_title TEXT NOT NULL,
              variant_order INTEGER NOT NULL,
              variant TEXT NOT NULL,
              PRIMARY KEY(normalized_title, variant_order),
              FOREIGN KEY(normalized_title) REFERENCES patterns(normalized_title)
            );

            CREATE TABLE IF NOT EXISTS pattern_depths (
              normalized_title TEXT NOT NULL,
              depth INTEGER NOT NULL,
              count INTEGER NOT NULL,
              PRIMARY KEY(normalized_title, depth),
              FOREIGN KEY(normalized_title) REFERENCES patterns(normalized_title)
            );

            CREATE TABLE IF NOT EXISTS pattern_parents (
              normalized_title TEXT NOT NULL,
              parent_rank INTEGER NOT NULL,
              parent_title TEXT NOT NULL,
              frequency INTEGER NOT NULL,
              PRIMARY KEY(normalized_title, parent_rank),
              FOREIGN KEY(normalized_title) REFERENCES patterns(normalized_title)
            );

            CREATE INDEX IF NOT EXISTS idx_patterns_confidence ON patterns(confidence DESC);
            ",
        )
        .context("failed to create pattern schema")?;
    Ok(())
}

/// Replaces the stored database with `database` in one transaction.
pub fn save_pattern_database(connection: &mut Connection, database: &PatternDatabase) -> Result<()> {
    let tx = connection
        .transaction()
        .context("failed to begin pattern transaction")?;

    tx.execute_batch(
        "
        DELETE FROM pattern_parents;
        DELETE FROM pattern_depths;
        DELETE FROM pattern_variants;
        DELETE FROM patterns;
        DELETE FROM metadata;
        ",
    )
    .context("failed to clear previous patterns")?;

    {
        let mut metadata = tx.prepare("INSERT INTO metadata(key, value) VALUES (?1, ?2)")?;
        metadata.execute(params!["schema_version", PATTERN_SCHEMA_VERSION])?;
        metadata.execute(params!["corpus_size", database.corpus_size.to_string()])?;
        metadata.execute(params!["built_at", database.built_at])?;

        let mut pattern_statement = tx.prepare(
            "INSERT INTO patterns(normalized_title, total_occurrences, confidence, most_common_depth)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut variant_statement = tx.prepare(
            "INSERT INTO pattern_variants(normalized_title, variant_order, variant) VALUES (?1, ?2, ?3)",
        )?;
        let mut depth_statement = tx.prepare(
            "INSERT INTO pattern_depths(normalized_title, depth, count) VALUES (?1, ?2, ?3)",
        )?;
        let mut parent_statement = tx.prepare(
            "INSERT INTO pattern_parents(normalized_title, parent_rank, parent_title, frequency)
             VALUES (?1, ?2, ?3, ?4)",
        )?;

        for pattern in &database.patterns {
            pattern_statement
                .execute(params![
                    pattern.normalized_title,
                    pattern.total_occurrences as i64,
                    pattern.confidence,
                    pattern.most_common_depth(),
                ])
                .with_context(|| format!("failed to insert pattern {}", pattern.normalized_title))?;

            for (order, variant) in pattern.original_title_variants.iter().enumerate() {
                variant_statement.execute(params![pattern.normalized_title, order as i64, variant])?;
            }
            for (depth, count) in &pattern.depth_frequency {
                depth_statement.execute(params![pattern.normalized_title, depth, *count as i64])?;
            }
            for (rank, parent) in pattern.typical_parents.iter().enumerate() {
                parent_statement.execute(params![
                    pattern.normalized_title,
                    rank as i64,
                    parent.normalized_title,
                    parent.frequency as i64,
                ])?;
            }
        }
    }

    tx.commit().context("failed to commit pattern database")?;
    Ok(())
}

pub fn load_pattern_database(connection: &Connection) -> Result<PatternDatabase> {
    let schema_version = read_metadata(connection, "schema_version")?;
    match schema_version.as_deref() {
        Some(PATTERN_SCHEMA_VERSION) => {}
        Some(other) => bail!("unsupported pattern schema version {other}"),
        None => bail!("pattern database has not been built yet"),
    }

    let corpus_size = read_metadata(connection, "corpus_size")?
        .unwrap_or_default()
        .parse::<usize>()
        .context("invalid corpus_size metadata")?;
    let built_at = read_metadata(connection, "built_at")?.unwrap_or_default();

    let mut variants: HashMap<String, Vec<String>> = HashMap::new();
    {
        let mut statement = connection.prepare(
            "SELECT normalized_title, variant FROM pattern_variants
             ORDER BY normalized_title, variant_order",
        )?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            variants
                .entry(row.get(0)?)
                .or_default()
                .push(row.get(1)?);
        }
    }

    let mut depths: HashMap<String, BTreeMap<u32, usize>> = HashMap::new();
    {
        let mut statement =
            connection.prepare("SELECT normalized_title, depth, count FROM pattern_depths")?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let count: i64 = row.get(2)?;
            depths
                .entry(row.get(0)?)
                .or_default()
                .insert(row.get(1)?, count as usize);
        }
    }

    let mut parents: HashMap<String, Vec<ParentFrequency>> = HashMap::new();
    {
        let mut statement = connection.prepare(
            "SELECT normalized_title, parent_title, frequency FROM pattern_parents
             ORDER BY normalized_title, parent_rank",
        )?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let frequency: i64 = row.get(2)?;
            parents
                .entry(row.get(0)?)
                .or_default()
                .push(ParentFrequency {
                    normalized_title: row.get(1)?,
                    frequency: frequency as usize,
                });
        }
    }

    let mut patterns = Vec::new();
    let mut statement = connection
        .prepare("SELECT normalized_title, total_occurrences, confidence FROM patterns")?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let normalized_title: String = row.get(0)?;
        let total_occurrences: i64 = row.get(1)?;
        patterns.push(SectionPattern {
            original_title_variants: variants.remove(&normalized_title).unwrap_or_default(),
            depth_frequency: depths.remove(&normalized_title).unwrap_or_default(),
            typical_parents: parents.remove(&normalized_title).unwrap_or_default(),
            total_occurrences: total_occurrences as usize,
            confidence: row.get(2)?,
            normalized_title,
        });
    }

    Ok(PatternDatabase::new(patterns, corpus_size, built_at))
}

fn read_metadata(connection: &Connection, key: &str) -> Result<Option<String>> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read metadata key {key}"))
}
