use super::*;

#[derive(Debug, Clone, Default)]
struct PatternEntry {
    variants: Vec<String>,
    depth_frequency: BTreeMap<u32, usize>,
    parents: Vec<ParentFrequency>,
    total_occurrences: usize,
}

impl PatternEntry {
    fn absorb(&mut self, other: PatternEntry) {
        for variant in other.variants {
            if !self.variants.contains(&variant) {
                self.variants.push(variant);
            }
        }
        for (depth, count) in other.depth_frequency {
            *self.depth_frequency.entry(depth).or_default() += count;
        }
        for parent in other.parents {
            self.add_parent(&parent.normalized_title, parent.frequency);
        }
        self.total_occurrences += other.total_occurrences;
    }

    fn add_parent(&mut self, parent: &str, frequency: usize) {
        match self
            .parents
            .iter_mut()
            .find(|entry| entry.normalized_title == parent)
        {
            Some(entry) => entry.frequency += frequency,
            None => self.parents.push(ParentFrequency {
                normalized_title: parent.to_string(),
                frequency,
            }),
        }
    }
}

/// Per-title counts gathered from one or more corpus trees. Partial
/// accumulators from independent files combine with [`PatternAccumulator::merge`].
#[derive(Debug, Clone, Default)]
pub struct PatternAccumulator {
    entries: HashMap<String, PatternEntry>,
    observations: usize,
}

impl PatternAccumulator {
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Records every non-root item of `root`. Items directly under the
    /// synthetic root record no parent.
    pub fn observe_tree(&mut self, root: &HierarchyItem) {
        let mut stack: Vec<(&HierarchyItem, Option<String>)> = root
            .sub_items
            .iter()
            .rev()
            .map(|item| (item, None))
            .collect();

        while let Some((item, parent_key)) = stack.pop() {
            let key = pattern_key(&item.display_text);

            let child_parent = if item.level == 0 || key.is_empty() {
                // nested synthetic roots and untitled items pass their parent through
                parent_key.clone()
            } else {
                self.observe(&key, &item.display_text, item.level, parent_key.as_deref());
                Some(key)
            };

            for child in item.sub_items.iter().rev() {
                stack.push((child, child_parent.clone()));
            }
        }
    }

    fn observe(&mut self, key: &str, display_text: &str, depth: u32, parent_key: Option<&str>) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.total_occurrences += 1;
        *entry.depth_frequency.entry(depth).or_default() += 1;

        let variant = condense_whitespace(display_text);
        if !entry.variants.contains(&variant) {
            entry.variants.push(variant);
        }

        if let Some(parent) = parent_key {
            entry.add_parent(parent, 1);
        }
        self.observations += 1;
    }

    pub fn merge(mut self, other: PatternAccumulator) -> PatternAccumulator {
        for (key, entry) in other.entries {
            self.entries.entry(key).or_default().absorb(entry);
        }
        self.observations += other.observations;
        self
    }

    pub fn finish(self, files_processed: usize, built_at: String) -> PatternDatabase {
        let patterns = self
            .entries
            .into_iter()
            .map(|(normalized_title, mut entry)| {
                entry.parents.sort_by(|a, b| {
                    b.frequency
                        .cmp(&a.frequency)
                        .then_with(|| a.normalized_title.cmp(&b.normalized_title))
                });

                let confidence = if files_processed == 0 {
                    0.0
                } else {
                    entry.total_occurrences as f64 / files_processed as f64
                };

                SectionPattern {
                    normalized_title,
                    original_title_variants: entry.variants,
                    depth_frequency: entry.depth_frequency,
                    typical_parents: entry.parents,
                    total_occurrences: entry.total_occurrences,
                    confidence,
                }
            })
            .collect();

        PatternDatabase::new(patterns, files_processed, built_at)
    }
}

#[derive(Debug)]
pub struct MineOutcome {
    pub database: PatternDatabase,
    pub processed: Vec<CorpusFileEntry>,
    pub warnings: Vec<String>,
    pub files_discovered: usize,
    pub observations: usize,
}

enum FileOutcome {
    Processed {
        entry: CorpusFileEntry,
        accumulator: PatternAccumulator,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
}

/// Mines `paths` in parallel. Each file yields its own accumulator; the
/// partial results are merged in path order so the outcome does not depend
/// on scheduling. Unreadable files are skipped with a warning.
pub fn build_pattern_database(paths: &[PathBuf], built_at: String) -> MineOutcome {
    let outcomes: Vec<FileOutcome> = paths
        .par_iter()
        .map(|path| match load_corpus_file(path) {
            Ok(corpus_doc) => {
                let mut accumulator = PatternAccumulator::default();
                accumulator.observe_tree(&corpus_doc.root);
                FileOutcome::Processed {
                    entry: CorpusFileEntry {
                        path: corpus_doc.path.display().to_string(),
                        sha256: corpus_doc.sha256.clone(),
                        item_count: corpus_doc.item_count(),
                    },
                    accumulator,
                }
            }
            Err(err) => FileOutcome::Skipped {
                path: path.clone(),
                reason: format!("{err:#}"),
            },
        })
        .collect();

    let mut merged = PatternAccumulator::default();
    let mut processed = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match outcome {
            FileOutcome::Processed { entry, accumulator } => {
                merged = merged.merge(accumulator);
                processed.push(entry);
            }
            FileOutcome::Skipped { path, reason } => {
                warn!(path = %path.display(), reason = %reason, "skipping unreadable corpus file");
                warnings.push(format!("skipped {}: {}", path.display(), reason));
            }
        }
    }

    let observations = merged.observations();
    let database = merged.finish(processed.len(), built_at);

    MineOutcome {
        database,
        processed,
        warnings,
        files_discovered: paths.len(),
        observations,
    }
}
