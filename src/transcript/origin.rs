//! Nucleotide derivation from the sequence origin.
//!
//! Fills the codon, exon and intron sequences of every isoform, oriented on the
//! gene's strand, and raises the ambiguous-base and splice-site flags.

use tracing::warn;

use crate::nucleotide::{forward_span, has_ambiguous, head, reverse_complement_span, tail};
use crate::sequence::Sequence;
use crate::strand::Strand;

use super::types::Isoform;

/// Canonical 5' and 3' splice-site dinucleotides.
pub const DONOR_SITE: &[u8] = b"GT";
pub const ACCEPTOR_SITE: &[u8] = b"AG";

/// Derive nucleotide fields for every isoform of the sequence.
pub fn fill_from_origin(sequence: &mut Sequence) {
    let origin = &sequence.origin;
    for gene in &mut sequence.genes {
        let strand = gene.strand;
        for isoform in &mut gene.isoforms {
            let end = isoform.coding_span().map_or(0, |span| span.end);
            if end as usize > origin.len() {
                warn!(
                    file = %sequence.source_file_name,
                    ref_seq_id = %sequence.ref_seq_id,
                    protein_xref = isoform.protein_xref.as_deref().unwrap_or(""),
                    end,
                    origin_length = origin.len(),
                    "isoform extends beyond the sequence origin"
                );
            }
            fill_isoform(isoform, strand, origin);
        }
    }
}

/// Strand-oriented bases of the span `[start, end]`.
fn oriented(origin: &[u8], start: u32, end: u32, strand: Strand) -> Vec<u8> {
    if strand.is_reverse() {
        reverse_complement_span(origin, start, end)
    } else {
        forward_span(origin, start, end)
    }
}

fn text(bases: &[u8]) -> String {
    String::from_utf8_lossy(bases).into_owned()
}

/// Derive codons, exon and intron sequences and quality flags for one isoform.
pub fn fill_isoform(isoform: &mut Isoform, strand: Strand, origin: &[u8]) {
    let Some(span) = isoform.coding_span() else {
        return;
    };

    let bases = oriented(origin, span.start, span.end, strand);
    isoform.start_codon = text(head(&bases, 3));
    isoform.end_codon = text(tail(&bases, 3));

    for exon in &mut isoform.exons {
        let bases = oriented(origin, exon.start, exon.end, strand);
        exon.start_codon = text(head(&bases, 3));
        exon.end_codon = text(tail(&bases, 3));
        exon.warning_n_in_sequence = has_ambiguous(&bases);
        if exon.warning_n_in_sequence {
            isoform.warning_in_coding_exon = true;
        }
        exon.origin = text(&bases);
    }

    for intron in &mut isoform.introns {
        let bases = oriented(origin, intron.start, intron.end, strand);
        let donor = head(&bases, 2);
        let acceptor = tail(&bases, 2);
        intron.warning_in_start_dinucleotide = donor != DONOR_SITE;
        intron.warning_in_end_dinucleotide = acceptor != ACCEPTOR_SITE;
        intron.error_main =
            intron.warning_in_start_dinucleotide || intron.warning_in_end_dinucleotide;
        if intron.error_main {
            isoform.warning_in_intron = true;
        }
        intron.warning_n_in_sequence = has_ambiguous(&bases);
        intron.start_dinucleotide = text(donor);
        intron.end_dinucleotide = text(acceptor);
        intron.origin = text(&bases);
    }
}
