//! GenBank feature location parser.
//!
//! Handles plain ranges (`100..200`), single positions (`150`), fuzzy bounds
//! (`<100..>200`), `join(...)`, `order(...)` and `complement(...)` in any
//! nesting, e.g. `complement(join(10..20,30..40))`.

use crate::strand::Strand;
use crate::transcript::types::Range;

/// A parsed feature location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Minimum start over all sub-ranges.
    pub start: u32,
    /// Maximum end over all sub-ranges.
    pub end: u32,
    pub strand: Strand,
    /// Sub-ranges in file order (not sorted).
    pub ranges: Vec<Range>,
}

impl Location {
    #[must_use]
    pub fn span(&self) -> Range {
        Range::new(self.start, self.end)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Extract the location expression from a feature value: every line before the
/// first qualifier line, joined without separators.
#[must_use]
pub fn location_text(feature_value: &str) -> String {
    feature_value
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with('/'))
        .collect()
}

/// Parse the location at the head of a feature value.
///
/// Elements that do not contain a number are skipped; a value with no usable
/// element yields an empty location.
#[must_use]
pub fn parse_location(feature_value: &str) -> Location {
    let text = location_text(feature_value);
    let mut complement = false;
    let mut ranges = Vec::new();
    collect_ranges(&text, &mut complement, &mut ranges);

    let start = ranges.iter().map(|r| r.start).min().unwrap_or(0);
    let end = ranges.iter().map(|r| r.end).max().unwrap_or(0);
    Location {
        start,
        end,
        strand: Strand::from_complement(complement),
        ranges,
    }
}

fn collect_ranges(expr: &str, complement: &mut bool, ranges: &mut Vec<Range>) {
    let expr = expr.trim();
    for operator in ["complement(", "join(", "order("] {
        if let Some(rest) = expr.strip_prefix(operator) {
            if operator == "complement(" {
                *complement = true;
            }
            let inner = &rest[..matching_paren(rest)];
            for element in split_top_level(inner) {
                collect_ranges(element, complement, ranges);
            }
            return;
        }
    }
    if let Some(range) = parse_element(expr) {
        ranges.push(range);
    }
}

/// Byte offset of the parenthesis closing an already-opened group, or the end
/// of the text when it is unbalanced.
fn matching_paren(text: &str) -> usize {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return idx,
            ')' => depth -= 1,
            _ => {}
        }
    }
    text.len()
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[begin..idx]);
                begin = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[begin..]);
    parts
}

/// Parse `A..B`, `A^B` or a bare position `A`, ignoring `<`/`>` markers and any
/// remote accession prefix (`NT_1.1:`).
fn parse_element(element: &str) -> Option<Range> {
    let element = element.rsplit(':').next().unwrap_or(element);
    let (first, second) = match element.split_once("..") {
        Some((a, b)) => (a, b),
        None => element.split_once('^').unwrap_or((element, element)),
    };
    let start = parse_position(first)?;
    let end = parse_position(second)?;
    Some(Range::new(start, end))
}

fn parse_position(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .collect();
    digits.trim().parse().ok()
}
