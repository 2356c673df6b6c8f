use std::borrow::Cow;

use anyhow::Result;
use tracing::info;

use crate::cli::NormalizeArgs;
use crate::document::{Document, DOCUMENT_ROOT, heading_name_with_depth};
use crate::util::{read_text, write_text};

/// Rebases header depths so the first header in document order becomes `h1`.
///
/// Returns the applied shift. With a zero shift the input is handed back
/// untouched; otherwise a rewritten copy is returned in which every header
/// moves by the same amount, clamped to `h1`..`h6`. Attributes and content
/// are kept.
pub fn normalize_header_depths(doc: &Document) -> (Cow<'_, Document>, i32) {
    let headings: Vec<_> = doc
        .subtree(DOCUMENT_ROOT)
        .into_iter()
        .filter_map(|id| doc.heading_depth(id).map(|depth| (id, depth)))
        .collect();

    let Some(&(_, first_depth)) = headings.first() else {
        return (Cow::Borrowed(doc), 0);
    };
    let shift = 1 - i32::from(first_depth);
    if shift == 0 {
        return (Cow::Borrowed(doc), 0);
    }

    let mut normalized = doc.clone();
    for (id, depth) in headings {
        let target = (i32::from(depth) + shift).clamp(1, 6) as u8;
        if let Some(name) = doc.element_name(id) {
            normalized.set_element_name(id, heading_name_with_depth(name, target));
        }
    }

    (Cow::Owned(normalized), shift)
}

/// Markup-level form of [`normalize_header_depths`]. Input that needs no shift
/// comes back byte for byte.
pub fn normalize_markup(markup: &str) -> Result<(String, i32)> {
    let doc = Document::parse(markup)?;
    match normalize_header_depths(&doc) {
        (Cow::Borrowed(_), shift) => Ok((markup.to_string(), shift)),
        (Cow::Owned(normalized), shift) => Ok((normalized.serialize(), shift)),
    }
}

pub fn run(args: NormalizeArgs) -> Result<()> {
    let markup = read_text(&args.input)?;
    let (normalized, shift) = normalize_markup(&markup)?;
    let output = args.output.as_ref().unwrap_or(&args.input);

    if shift == 0 {
        info!(path = %args.input.display(), "first header already at depth 1; nothing to do");
    } else {
        info!(path = %args.input.display(), shift, "shifted header depths");
    }

    write_text(output, &normalized)?;
    info!(path = %output.display(), "wrote normalized fragment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Notes</title></head><body><h3 id="n" class="title">Notes</h3><p>Text</p><h4>Accounting <em>Policies</em></h4><h5>Deep</h5></body></html>
"#;

    #[test]
    fn shifts_every_header_by_the_first_depth() {
        let doc = Document::parse(FRAGMENT).unwrap();
        let (normalized, shift) = normalize_header_depths(&doc);
        assert_eq!(shift, -2);
        assert!(matches!(normalized, Cow::Owned(_)));

        let depths: Vec<u8> = normalized.headers().iter().map(|header| header.depth).collect();
        assert_eq!(depths, vec![1, 2, 3]);

        let markup = normalized.serialize();
        assert!(markup.contains(r#"<h1 id="n" class="title">Notes</h1>"#));
        assert!(markup.contains("<h2>Accounting <em>Policies</em></h2>"));

        // source document is untouched
        assert_eq!(doc.headers()[0].depth, 3);
    }

    #[test]
    fn normalizing_twice_is_byte_identical() {
        let (once, shift) = normalize_markup(FRAGMENT).unwrap();
        assert_eq!(shift, -2);

        let (twice, shift) = normalize_markup(&once).unwrap();
        assert_eq!(shift, 0);
        assert_eq!(twice, once);
    }

    #[test]
    fn deeper_headers_are_clamped() {
        let doc = Document::parse("<body><h2>A</h2><h6>B</h6><h1>C</h1></body>").unwrap();
        let (normalized, shift) = normalize_header_depths(&doc);
        assert_eq!(shift, -1);

        let depths: Vec<u8> = normalized.headers().iter().map(|header| header.depth).collect();
        assert_eq!(depths, vec![1, 5, 1]);
    }

    #[test]
    fn fragments_without_headers_are_returned_as_is() {
        let doc = Document::parse("<body><p>no headers</p></body>").unwrap();
        let (normalized, shift) = normalize_header_depths(&doc);
        assert_eq!(shift, 0);
        assert!(matches!(normalized, Cow::Borrowed(_)));
    }
}
