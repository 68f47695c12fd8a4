//! Placeholder detection with false-positive suppression
//!
//! Templates mark substitution points as `{name}`, but braces also show up in
//! embedded JSON fragments, code snippets and output-format instructions. The
//! detector extracts candidate names left-to-right and rejects anything that
//! looks like structured-data syntax rather than a deliberate variable name.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Context window (in characters) inspected around a candidate when checking
/// whether it sits inside a quoted string.
const QUOTE_WINDOW: usize = 100;

/// Names longer than this are treated as not a deliberate variable name.
const MAX_NAME_LEN: usize = 50;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^}]+\}").expect("valid placeholder pattern"))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"))
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("valid numeric pattern"))
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // \w is Unicode-aware, so non-ASCII word characters are allowed
    RE.get_or_init(|| Regex::new(r"^\w+$").expect("valid word pattern"))
}

/// Detect placeholder variable names in template text
///
/// Scans left-to-right for `{...}` spans and returns the set of inner names
/// that pass the filtering rules. A name appearing twice counts once; usage
/// is per (template, variable) pair, not per occurrence.
pub fn detect(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for m in placeholder_re().find_iter(text) {
        let inner = &text[m.start() + 1..m.end() - 1];
        if is_valid_candidate(inner, text, m.start(), m.end()) {
            found.insert(inner.to_string());
        }
    }

    found
}

/// Byte offsets of every valid `{name}` occurrence in the text
pub fn placeholder_positions(text: &str, name: &str) -> Vec<usize> {
    let token = format!("{{{name}}}");
    let mut positions = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find(&token) {
        let start = search_from + rel;
        let end = start + token.len();
        if is_valid_candidate(name, text, start, end) {
            positions.push(start);
        }
        search_from = end;
    }

    positions
}

/// Decide whether brace content is a variable name rather than stray syntax
///
/// `start` and `end` are the byte offsets of the surrounding `{` and the
/// position just past the `}` in `text`.
fn is_valid_candidate(content: &str, text: &str, start: usize, end: usize) -> bool {
    // Rule 1: empty or all-whitespace content
    if content.trim().is_empty() {
        return false;
    }

    // Rule 2: structured-data syntax inside the braces
    if content
        .chars()
        .any(|c| matches!(c, '"' | ':' | ',' | '[' | ']' | '{' | '}'))
    {
        return false;
    }

    // Rule 3: purely numeric content is not a variable name
    if numeric_re().is_match(content) {
        return false;
    }

    let is_identifier = identifier_re().is_match(content);

    // Rule 4: odd quote counts on both sides suggest the candidate sits
    // inside a quoted string; identifier-shaped names are still accepted
    let quotes_before = text[..start]
        .chars()
        .rev()
        .take(QUOTE_WINDOW)
        .filter(|&c| c == '"')
        .count();
    let quotes_after = text[end..]
        .chars()
        .take(QUOTE_WINDOW)
        .filter(|&c| c == '"')
        .count();
    if quotes_before % 2 == 1 && quotes_after % 2 == 1 && !is_identifier {
        return false;
    }

    // Rule 5: braces directly adjacent to `:` or `,` usually belong to a
    // JSON structure; again, identifier-shaped names survive
    let char_before = text[..start].chars().next_back();
    let char_after = text[end..].chars().next();
    if (matches!(char_before, Some(':') | Some(',')) || matches!(char_after, Some(':') | Some(',')))
        && !is_identifier
    {
        return false;
    }

    // Rule 6: word characters only (letters, digits, underscore; Unicode)
    if !word_re().is_match(content) {
        return false;
    }

    // Rule 7: sanity bound on name length
    if content.chars().count() > MAX_NAME_LEN {
        return false;
    }

    true
}
