//! Feature qualifier parser.
//!
//! A single forward scan over the feature text recognises the three qualifier
//! shapes: `/key="quoted value"`, `/key=123` and the bare flag `/key`. A
//! qualifier starts with `/` at the beginning of a line; text inside a quoted
//! value is never rescanned.

use std::collections::BTreeMap;

use super::header::fold_whitespace;

/// Key whose repeated occurrences accumulate instead of overwriting.
pub const DB_XREF: &str = "db_xref";

/// Qualifiers of one feature, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    values: BTreeMap<String, String>,
}

impl Qualifiers {
    /// Parse the qualifiers of a folded feature value (lines separated by `\n`).
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut qualifiers = Self::default();
        let mut pos = 0;
        while pos < text.len() {
            let line_end = line_end(text, pos);
            let line = &text[pos..line_end];
            let indent = line.len() - line.trim_start().len();
            if !line[indent..].starts_with('/') {
                pos = line_end + 1;
                continue;
            }

            let key_start = pos + indent + 1;
            let key_end = text[key_start..line_end]
                .find(|c: char| c == '=' || c.is_whitespace())
                .map_or(line_end, |offset| key_start + offset);
            let key = &text[key_start..key_end];
            if key.is_empty() {
                pos = line_end + 1;
                continue;
            }

            if !text[key_end..line_end].starts_with('=') {
                qualifiers.insert_flag(key);
                pos = line_end + 1;
                continue;
            }

            let value_start = key_end + 1;
            if text[value_start..].starts_with('"') {
                let (raw, closed_at) = read_quoted(text, value_start + 1);
                qualifiers.insert(key, fold_whitespace(&raw));
                pos = line_end_after(text, closed_at) + 1;
                continue;
            }

            let rest = text[value_start..line_end].trim();
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .map_or(rest, |end| &rest[..end]);
            if !digits.is_empty() {
                qualifiers.insert(key, digits.to_string());
            } else if !rest.is_empty() {
                qualifiers.insert(key, rest.to_string());
            } else {
                qualifiers.insert_flag(key);
            }
            pos = line_end + 1;
        }
        qualifiers
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Individual `db_xref` values in file order.
    pub fn db_xref_entries(&self) -> impl Iterator<Item = &str> {
        self.get(DB_XREF)
            .into_iter()
            .flat_map(|joined| joined.split('\n'))
            .filter(|entry| !entry.is_empty())
    }

    /// First `db_xref` value starting with `prefix`, e.g. `GeneID:` or `GI:`.
    #[must_use]
    pub fn find_xref(&self, prefix: &str) -> Option<&str> {
        self.db_xref_entries().find(|entry| entry.starts_with(prefix))
    }

    /// NCBI gene id from a `GeneID:<id>` cross-reference.
    #[must_use]
    pub fn gene_id(&self) -> Option<&str> {
        self.find_xref("GeneID:")
            .and_then(|entry| entry.split(':').nth(1))
            .filter(|id| !id.is_empty())
    }

    /// Reading-frame start from `/codon_start`, 1 to 3 in well-formed files.
    #[must_use]
    pub fn codon_start(&self) -> Option<u32> {
        self.get("codon_start").and_then(|value| value.parse().ok())
    }

    fn insert(&mut self, key: &str, value: String) {
        if key == DB_XREF {
            let joined = self.values.entry(key.to_string()).or_default();
            if !joined.is_empty() {
                joined.push('\n');
            }
            joined.push_str(&value);
        } else {
            self.values.insert(key.to_string(), value);
        }
    }

    fn insert_flag(&mut self, key: &str) {
        self.values.entry(key.to_string()).or_default();
    }
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |offset| from + offset)
}

/// End of the line containing `pos`, clamped to the text.
fn line_end_after(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        text.len()
    } else {
        line_end(text, pos)
    }
}

/// Read a quoted value starting just after the opening quote. `""` is an escaped
/// quote. Returns the raw value and the byte offset just past the closing quote
/// (or the end of the text when unterminated).
fn read_quoted(text: &str, start: usize) -> (String, usize) {
    let mut value = String::new();
    let mut chars = text[start..].char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        if c != '"' {
            value.push(c);
            continue;
        }
        if chars.peek().is_some_and(|&(_, next)| next == '"') {
            chars.next();
            value.push('"');
            continue;
        }
        return (value, start + offset + 1);
    }
    (value, text.len())
}
