//! Top-level header fields: LOCUS, DEFINITION, VERSION and ORGANISM.

use chrono::NaiveDate;

use crate::sequence::GbkDate;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Oldest and newest years accepted in a LOCUS date.
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 2039;

/// Fields of a LOCUS line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locus {
    pub accession: String,
    pub length: u32,
    pub date: GbkDate,
}

/// Parse a LOCUS value such as
/// `NT_008705   39626682 bp    DNA     linear   CON 12-MAR-2015`.
#[must_use]
pub fn parse_locus(value: &str) -> Locus {
    let words: Vec<&str> = value.split_whitespace().collect();
    Locus {
        accession: words.first().map(|w| (*w).to_string()).unwrap_or_default(),
        length: words.get(1).and_then(|w| w.parse().ok()).unwrap_or(0),
        date: words.last().map_or(GbkDate::Absent, |w| parse_date(w)),
    }
}

/// Parse a `DD-MON-YYYY` token. Tokens without that shape are `Absent`; tokens
/// with it but outside the supported calendar range are `Invalid`.
#[must_use]
pub fn parse_date(token: &str) -> GbkDate {
    let mut parts = token.splitn(3, '-');
    let (Some(day), Some(month), Some(year)) = (parts.next(), parts.next(), parts.next()) else {
        return GbkDate::Absent;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(day) || month.is_empty() || year.len() != 4 || !all_digits(year) {
        return GbkDate::Absent;
    }

    let day: u32 = day.parse().unwrap_or(0);
    let year: i32 = year.parse().unwrap_or(0);
    let month_key: String = month.to_lowercase().chars().take(3).collect();
    let month = MONTHS
        .iter()
        .position(|m| *m == month_key)
        .map_or(0, |index| index as u32 + 1);

    let in_range = (1..=31).contains(&day)
        && (1..=12).contains(&month)
        && (MIN_YEAR..=MAX_YEAR).contains(&year);
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) if in_range => GbkDate::Valid(date),
        _ => GbkDate::Invalid,
    }
}

/// Organism name and taxonomy lineage from an ORGANISM value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganismField {
    pub name: String,
    pub taxonomy: Vec<String>,
}

/// Parse an ORGANISM value: the first line is the name, the following lines a
/// `;`-separated lineage. A non-blank `name_override` replaces the declared name.
#[must_use]
pub fn parse_organism(value: &str, name_override: Option<&str>) -> OrganismField {
    let mut lines = value.split('\n').filter(|line| !line.trim().is_empty());
    let declared = lines.next().map(str::trim).unwrap_or_default();
    let name = match name_override.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => declared.to_string(),
    };
    let taxonomy = lines
        .flat_map(|line| line.split(';'))
        .map(|word| fold_whitespace(&word.replace('.', "")))
        .filter(|word| !word.is_empty())
        .collect();
    OrganismField { name, taxonomy }
}

/// Replace every run of whitespace (newlines included) with a single space and trim.
#[must_use]
pub fn fold_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
