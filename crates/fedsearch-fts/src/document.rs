//! Searchable view over a record.
//!
//! `SearchDocument` provides the matching, relevance, and highlighting used
//! by `MemoryBackend`. Matching is ASCII case-insensitive substring search
//! over string-valued fields (and strings nested one level in arrays).
//!
//! # Relevance Scoring
//!
//! Each matching field contributes a weight: `name` 3.0, `description` 2.0,
//! everything else 1.0. The sum `w` is squashed into `(0, 1)` as
//! `w / (w + 1)`.

use fedsearch_core::Record;
use serde_json::{Map, Value};

/// Highlight opening tag.
pub const HIGHLIGHT_PRE: &str = "<em>";

/// Highlight closing tag.
pub const HIGHLIGHT_POST: &str = "</em>";

/// A record as seen by the in-memory scan.
#[derive(Debug, Clone)]
pub struct SearchDocument {
    record: Record,
}

impl SearchDocument {
    /// Wrap a record.
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    /// The wrapped record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Module the document belongs to.
    pub fn module(&self) -> &str {
        &self.record.module
    }

    /// Field names this document exposes for materialization.
    pub fn data_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.record.fields.keys().cloned().collect();
        if self.record.email_address.is_some() && !self.record.fields.contains_key("email") {
            fields.push("email".to_string());
        }
        fields
    }

    /// Whether any searchable field contains `term`.
    pub fn matches_query(&self, term: &str) -> bool {
        self.matching_fields(term).next().is_some()
    }

    /// Weighted relevance in `(0, 1)`, or 0.0 when nothing matches.
    pub fn relevance(&self, term: &str) -> f64 {
        let weight: f64 = self
            .matching_fields(term)
            .map(|(name, _)| field_weight(name))
            .sum();
        weight / (weight + 1.0)
    }

    /// Highlight fragments for every matching field.
    pub fn highlights(&self, term: &str) -> Map<String, Value> {
        self.matching_fields(term)
            .map(|(name, text)| (name.clone(), Value::String(highlight(text, term))))
            .collect()
    }

    fn matching_fields<'a>(&'a self, term: &'a str) -> impl Iterator<Item = (&'a String, &'a str)> {
        self.record.fields.iter().filter_map(move |(name, value)| {
            searchable_text(value)
                .find(|text| find_ascii_ci(text, term).is_some())
                .map(|text| (name, text))
        })
    }
}

fn field_weight(name: &str) -> f64 {
    match name {
        "name" => 3.0,
        "description" => 2.0,
        _ => 1.0,
    }
}

/// Strings of a field value, including one level of array nesting.
fn searchable_text(value: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match value {
        Value::String(s) => Box::new(std::iter::once(s.as_str())),
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_str)),
        _ => Box::new(std::iter::empty()),
    }
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    (0..=hay.len() - pat.len())
        .filter(|&i| haystack.is_char_boundary(i) && haystack.is_char_boundary(i + pat.len()))
        .find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

/// Wrap every occurrence of `term` in highlight tags, preserving case.
pub fn highlight(text: &str, term: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(pos) = find_ascii_ci(rest, term) {
        let end = pos + term.len();
        out.push_str(&rest[..pos]);
        out.push_str(HIGHLIGHT_PRE);
        out.push_str(&rest[pos..end]);
        out.push_str(HIGHLIGHT_POST);
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================
