//! Quality checks over finished isoforms: premature in-frame stop codons and
//! real-exon identity across the isoforms of a gene.

use std::collections::HashMap;

use crate::nucleotide::is_stop_codon;

use super::types::{Gene, Isoform, Range};

/// True when an in-frame stop codon occurs before the last five bases of the
/// spliced coding sequence.
#[must_use]
pub fn has_premature_stop(coding: &[u8]) -> bool {
    let mut i = 0;
    while i + 5 < coding.len() {
        if is_stop_codon(&coding[i..i + 3]) {
            return true;
        }
        i += 3;
    }
    false
}

/// Concatenated exon sequences of an isoform, in transcription order.
#[must_use]
pub fn spliced_sequence(isoform: &Isoform) -> Vec<u8> {
    let length = isoform.exons.iter().map(|e| e.origin.len()).sum();
    let mut coding = Vec::with_capacity(length);
    for exon in &isoform.exons {
        coding.extend_from_slice(exon.origin.as_bytes());
    }
    coding
}

/// Set `error_main` on isoforms with a premature stop codon.
pub fn check_premature_stop(isoform: &mut Isoform) {
    if has_premature_stop(&spliced_sequence(isoform)) {
        isoform.error_main = true;
    }
}

/// Assign real-exon ids within one gene. Distinct spans are numbered from 1 in
/// coordinate order; exons sharing a span share its id.
pub fn assign_real_exon_ids(gene: &mut Gene) {
    let mut spans: Vec<Range> = gene
        .isoforms
        .iter()
        .flat_map(|iso| iso.exons.iter().map(|exon| exon.span()))
        .collect();
    spans.sort_unstable();
    spans.dedup();

    let ids: HashMap<Range, u32> = spans
        .into_iter()
        .zip(1..)
        .collect();

    for exon in gene.isoforms.iter_mut().flat_map(|iso| iso.exons.iter_mut()) {
        exon.real_exon_id = ids.get(&exon.span()).copied().unwrap_or(0);
    }
}
