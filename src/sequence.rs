//! Sequence records: one GenBank entry with its header fields, origin and genes.

use chrono::NaiveDate;
use serde::Serialize;

use crate::transcript::types::Gene;

/// Date from the trailing `DD-MON-YYYY` token of a LOCUS line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum GbkDate {
    /// No date token on the LOCUS line.
    #[default]
    Absent,
    /// A date token that did not resolve to a calendar date in the supported range.
    Invalid,
    Valid(NaiveDate),
}

/// One GenBank record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub ref_seq_id: String,
    pub length: u32,
    pub date: GbkDate,
    pub description: String,
    pub version: String,
    /// Registry key of the organism.
    pub organism: Option<String>,
    /// Registry key of the chromosome (scoped by organism).
    pub chromosome: Option<String>,
    pub source_file_name: String,
    /// Uppercased nucleotide buffer from the ORIGIN section.
    #[serde(skip)]
    pub origin: Vec<u8>,
    pub genes: Vec<Gene>,
}

impl Sequence {
    #[must_use]
    pub fn new(source_file_name: &str) -> Self {
        Self {
            source_file_name: source_file_name.to_string(),
            ..Default::default()
        }
    }

    /// A record with neither genes nor a description carries nothing worth keeping.
    #[must_use]
    pub fn is_empty_record(&self) -> bool {
        self.genes.is_empty() && self.description.is_empty()
    }

    #[must_use]
    pub fn isoform_count(&self) -> usize {
        self.genes.iter().map(|g| g.isoforms.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_detection() {
        let mut seq = Sequence::new("chr1.gbk");
        assert!(seq.is_empty_record());
        seq.description = "Homo sapiens chromosome 1".to_string();
        assert!(!seq.is_empty_record());
        seq.description.clear();
        seq.genes.push(Gene::default());
        assert!(!seq.is_empty_record());
    }

    #[test]
    fn date_serialization() {
        let date = GbkDate::Valid(NaiveDate::from_ymd_opt(2015, 3, 12).unwrap());
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, r#"{"status":"valid","date":"2015-03-12"}"#);
        assert_eq!(
            serde_json::to_string(&GbkDate::Invalid).unwrap(),
            r#"{"status":"invalid"}"#
        );
    }
}
