//! Transcript model and the passes that build it from GenBank features.

pub mod construction;
pub mod origin;
pub mod quality;
pub mod reconcile;
pub mod types;

use crate::sequence::Sequence;

/// Post-record passes, run once every feature of the record has been applied:
/// real-exon ids, nucleotide derivation, then the premature-stop check.
pub fn finish_sequence(sequence: &mut Sequence) {
    for gene in &mut sequence.genes {
        quality::assign_real_exon_ids(gene);
    }
    origin::fill_from_origin(sequence);
    for isoform in sequence.genes.iter_mut().flat_map(|g| g.isoforms.iter_mut()) {
        quality::check_premature_stop(isoform);
    }
}
