//! Flat header stream derived from a transformed document: the whitelist
//! the validator checks against and the record list the manual editor works on.

use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::document::{self, Document};
use crate::model::{HeaderRecord, WhitelistEntry};
use crate::util::read_json;

pub struct NumericLabelParser {
    leading_number: Regex,
}

impl NumericLabelParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            leading_number: Regex::new(r"^\s*(\d+(?:\.\d+)*)\.?\s+\S")
                .context("failed to compile numeric label regex")?,
        })
    }

    /// Leading section number of a header text (`"2.1 Balance Sheet"` -> `"2.1"`).
    pub fn parse(&self, text: &str) -> Option<String> {
        self.leading_number
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }
}

pub fn whitelist_from_document(doc: &Document) -> Result<Vec<WhitelistEntry>> {
    let labels = NumericLabelParser::new()?;
    Ok(doc
        .headers()
        .into_iter()
        .map(|header| WhitelistEntry {
            numeric_label: labels.parse(&header.text),
            depth_label: format!("h{}", header.depth),
            display_text: header.text,
        })
        .collect())
}

pub fn header_records_from_document(doc: &Document) -> Vec<HeaderRecord> {
    doc.headers()
        .into_iter()
        .enumerate()
        .map(|(index, header)| HeaderRecord {
            id: format!("hdr-{}", index + 1),
            depth_label: format!("h{}", header.depth),
            display_text: header.text,
            position_path: header.position_path,
            is_used: false,
            is_excluded: false,
            indent_level: 0,
        })
        .collect()
}

/// Loads a whitelist from JSON, or derives it from an (X)HTML document.
pub fn load_whitelist(path: &Path) -> Result<Vec<WhitelistEntry>> {
    if is_json(path) {
        let entries: Vec<WhitelistEntry> = read_json(path)?;
        if entries.is_empty() {
            bail!("whitelist {} contains no headers", path.display());
        }
        return Ok(entries);
    }

    let doc = document::parse_file(path)?;
    whitelist_from_document(&doc)
}

/// Loads header records from JSON, or derives them from an (X)HTML document.
pub fn load_header_records(path: &Path) -> Result<Vec<HeaderRecord>> {
    if is_json(path) {
        return read_json(path);
    }

    let doc = document::parse_file(path)?;
    Ok(header_records_from_document(&doc))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_label_extracts_leading_section_numbers() {
        let labels = NumericLabelParser::new().unwrap();
        assert_eq!(labels.parse("2.1 Balance Sheet"), Some("2.1".to_string()));
        assert_eq!(labels.parse("3. Notes"), Some("3".to_string()));
        assert_eq!(labels.parse("Notes 3"), None);
        assert_eq!(labels.parse("2024"), None);
    }

    #[test]
    fn records_follow_document_order() {
        let doc = Document::parse(
            "<html><body><h1>1 Intro</h1><p>x</p><h3>1.1 Scope</h3><h2>2 Results</h2></body></html>",
        )
        .unwrap();

        let whitelist = whitelist_from_document(&doc).unwrap();
        assert_eq!(whitelist.len(), 3);
        assert_eq!(whitelist[1].depth_label, "h3");
        assert_eq!(whitelist[1].numeric_label.as_deref(), Some("1.1"));

        let records = header_records_from_document(&doc);
        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["hdr-1", "hdr-2", "hdr-3"]);
        assert!(records.iter().all(|record| record.indent_level == 0));
        assert_eq!(records[2].position_path, "/html[1]/body[1]/h2[1]");
    }
}
