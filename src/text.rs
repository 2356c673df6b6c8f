//! Text keys used to compare headings across documents.

/// Key for the pattern database: lowercase with every punctuation and
/// whitespace character removed, so `"Notes to the Financial Statements."`
/// and `"Notes to the financial statements"` collapse to one entry.
pub fn pattern_key(input: &str) -> String {
    input
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Key for header matching: internal whitespace runs (spaces, tabs,
/// newlines) collapsed to one space, trimmed, lowercased.
pub fn match_key(input: &str) -> String {
    condense_whitespace(input).to_lowercase()
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// File-name friendly form of a heading.
pub fn slugify(input: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else {
            out.push('-');
        }
    }

    while out.contains("--") {
        out = out.replace("--", "-");
    }

    let trimmed: String = out.trim_matches('-').chars().take(max_len).collect();
    let trimmed = trimmed.trim_end_matches('-');
    if trimmed.is_empty() {
        "section".to_string()
    } else {
        trimmed.to_string()
    }
}
