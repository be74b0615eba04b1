//! Gene, isoform, exon and intron model reconstructed from GenBank features.
//!
//! Ownership is a strict tree: a `Sequence` owns its genes, a gene owns its
//! isoforms and an isoform owns its exons and introns. Back-references are plain
//! indices into the owning collections.

use serde::Serialize;

use crate::strand::Strand;

/// An immutable 1-based inclusive genomic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Build a range list from parallel start/end lists. Extra elements in the
    /// longer list are ignored.
    #[must_use]
    pub fn create_list(starts: &[u32], ends: &[u32]) -> Vec<Range> {
        starts
            .iter()
            .zip(ends)
            .map(|(&start, &end)| Range::new(start, end))
            .collect()
    }

    /// True when `other` lies entirely within this range.
    #[must_use]
    pub fn contains(&self, other: &Range) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// Gene record declared by a `gene` feature.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gene {
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub name: Option<String>,
    pub ncbi_gene_id: Option<String>,
    pub is_pseudo_gene: bool,
    pub has_cds: bool,
    pub has_rna: bool,
    pub is_protein_but_not_rna: bool,
    /// Span of the most recently attached CDS.
    pub start_code: Option<u32>,
    pub end_code: Option<u32>,
    pub max_introns_count: u32,
    pub isoforms: Vec<Isoform>,
}

impl Gene {
    #[must_use]
    pub fn span(&self) -> Range {
        Range::new(self.start, self.end)
    }
}

/// Kind of isoform. A `Cds` isoform is an mRNA isoform carrying a coding interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IsoformType {
    Mrna,
    Cds,
}

/// One transcript of a gene.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Isoform {
    pub isoform_type: IsoformType,
    /// Index of the owning gene within its sequence.
    pub gene_index: usize,
    pub mrna_start: Option<u32>,
    pub mrna_end: Option<u32>,
    pub cds_start: Option<u32>,
    pub cds_end: Option<u32>,
    pub exons_mrna_count: u32,
    pub exons_cds_count: u32,
    pub mrna_ranges: Vec<Range>,
    pub exons: Vec<Exon>,
    pub introns: Vec<Intron>,
    pub protein_id: Option<String>,
    pub protein_xref: Option<String>,
    pub product: Option<String>,
    pub note: Option<String>,
    pub translation: Option<String>,
    pub start_codon: String,
    pub end_codon: String,
    pub error_main: bool,
    pub warning_in_intron: bool,
    pub warning_in_coding_exon: bool,
    pub is_maximum_by_introns: bool,
}

impl Isoform {
    /// A CDS-less isoform declared by an `mRNA` feature.
    #[must_use]
    pub fn from_mrna(gene_index: usize, span: Range, ranges: Vec<Range>) -> Self {
        Self {
            isoform_type: IsoformType::Mrna,
            gene_index,
            mrna_start: Some(span.start),
            mrna_end: Some(span.end),
            cds_start: None,
            cds_end: None,
            exons_mrna_count: ranges.len() as u32,
            exons_cds_count: 0,
            mrna_ranges: ranges,
            exons: Vec::new(),
            introns: Vec::new(),
            protein_id: None,
            protein_xref: None,
            product: None,
            note: None,
            translation: None,
            start_codon: String::new(),
            end_codon: String::new(),
            error_main: false,
            warning_in_intron: false,
            warning_in_coding_exon: false,
            is_maximum_by_introns: false,
        }
    }

    /// Copy of this transcript model for an alternative coding reading of the
    /// same mRNA. Scalar fields are duplicated; exons and introns are not shared
    /// and start empty so the caller can rebuild them.
    #[must_use]
    pub fn duplicate_for_alternate_cds(&self) -> Self {
        Self {
            exons: Vec::new(),
            introns: Vec::new(),
            mrna_ranges: self.mrna_ranges.clone(),
            protein_id: self.protein_id.clone(),
            protein_xref: self.protein_xref.clone(),
            product: self.product.clone(),
            note: self.note.clone(),
            translation: self.translation.clone(),
            start_codon: self.start_codon.clone(),
            end_codon: self.end_codon.clone(),
            ..*self
        }
    }

    #[must_use]
    pub fn has_cds(&self) -> bool {
        self.isoform_type == IsoformType::Cds
    }

    /// Span covered by the mRNA and CDS coordinates together.
    #[must_use]
    pub fn coding_span(&self) -> Option<Range> {
        let start = match (self.cds_start, self.mrna_start) {
            (Some(c), Some(m)) => c.min(m),
            (c, m) => c.or(m)?,
        };
        let end = match (self.cds_end, self.mrna_end) {
            (Some(c), Some(m)) => c.max(m),
            (c, m) => c.or(m)?,
        };
        Some(Range::new(start, end))
    }
}

/// Position of an exon within its isoform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExonType {
    OneExon,
    Start,
    Inner,
    End,
}

/// A coding exon, ordered in transcription direction within its isoform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exon {
    pub start: u32,
    pub end: u32,
    pub index: u32,
    pub rev_index: u32,
    pub exon_type: ExonType,
    pub start_phase: u8,
    pub end_phase: u8,
    pub length_phase: u8,
    pub origin: String,
    pub start_codon: String,
    pub end_codon: String,
    pub warning_n_in_sequence: bool,
    pub real_exon_id: u32,
    pub from_main_isoform: bool,
    /// Degenerate exon whose corrected start passed its end.
    pub stash: bool,
}

impl Exon {
    #[must_use]
    pub fn span(&self) -> Range {
        Range::new(self.start, self.end)
    }
}

/// Intron between two consecutive exons of an isoform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intron {
    pub start: u32,
    pub end: u32,
    pub index: u32,
    pub rev_index: u32,
    /// Reading-frame phase at the intron, equal to the preceding exon's end phase.
    pub phase: u8,
    pub length_phase: u8,
    /// 1-based classification code in `[1, 27]`.
    pub intron_type_id: u8,
    /// Indices of the flanking exons within the isoform.
    pub prev_exon: usize,
    pub next_exon: usize,
    pub origin: String,
    pub start_dinucleotide: String,
    pub end_dinucleotide: String,
    pub warning_in_start_dinucleotide: bool,
    pub warning_in_end_dinucleotide: bool,
    pub error_main: bool,
    pub warning_n_in_sequence: bool,
    pub from_main_isoform: bool,
}
