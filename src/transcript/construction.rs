//! Exon and intron construction for coding isoforms.
//!
//! Sub-ranges arrive in file order. They are walked in transcription order
//! (reversed on the reverse strand) while the reading-frame phase is carried
//! from exon to exon; introns are then synthesized between neighbours.

use crate::strand::Strand;

use super::types::{Exon, ExonType, Gene, Intron, Range};

/// Build the exons and introns of `gene.isoforms[isoform_index]` from its CDS
/// sub-ranges, then refresh the gene's main-isoform tags.
pub fn build_exons_and_introns(
    gene: &mut Gene,
    isoform_index: usize,
    ranges: &[Range],
    strand: Strand,
    codon_start: Option<u32>,
) {
    let Some(isoform) = gene.isoforms.get_mut(isoform_index) else {
        return;
    };
    if ranges.is_empty() {
        return;
    }

    let exons = build_exons(ranges, strand, codon_start);
    let multi_exon = exons.len() > 1;
    if multi_exon && exons.last().is_some_and(|last| last.start == last.end) {
        isoform.error_main = true;
    }

    isoform.introns = insert_introns(&exons, strand);
    isoform.exons_cds_count = exons.len() as u32;
    isoform.exons = exons;

    tag_main_isoforms(gene);
}

/// Exons in transcription order with phase bookkeeping.
fn build_exons(ranges: &[Range], strand: Strand, codon_start: Option<u32>) -> Vec<Exon> {
    let ordered: Vec<Range> = if strand.is_reverse() {
        ranges.iter().rev().copied().collect()
    } else {
        ranges.to_vec()
    };

    let count = ordered.len();
    let mut exons = Vec::with_capacity(count);
    let mut phase: u8 = 0;

    for (index, range) in ordered.iter().enumerate() {
        let mut start = range.start;
        if index == 0 {
            // codon_start is 1-based; shift the first exon into frame
            start = start.saturating_add(codon_start.unwrap_or(1).saturating_sub(1));
        }

        let exon_type = match index {
            _ if count == 1 => ExonType::OneExon,
            0 => ExonType::Start,
            i if i == count - 1 => ExonType::End,
            _ => ExonType::Inner,
        };

        let mut exon = Exon {
            start,
            end: range.end,
            index: index as u32,
            rev_index: (count - index - 1) as u32,
            exon_type,
            start_phase: 0,
            end_phase: 0,
            length_phase: 0,
            origin: String::new(),
            start_codon: String::new(),
            end_codon: String::new(),
            warning_n_in_sequence: false,
            real_exon_id: 0,
            from_main_isoform: false,
            stash: false,
        };

        if start > range.end {
            // degenerate after the frame shift: keep a zero-length placeholder
            exon.start = range.end;
            exon.stash = true;
            phase = 0;
        } else {
            let length = u64::from(range.end - start) + 1;
            exon.length_phase = (length % 3) as u8;
            exon.start_phase = phase;
            phase = ((u64::from(phase) + length) % 3) as u8;
            exon.end_phase = phase;
        }
        exons.push(exon);
    }
    exons
}

/// Introns between consecutive exons (exons in transcription order).
fn insert_introns(exons: &[Exon], strand: Strand) -> Vec<Intron> {
    let count = exons.len();
    exons
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (prev, next) = (&pair[0], &pair[1]);
            let (start, end) = if strand.is_reverse() {
                (i64::from(next.end) + 1, i64::from(prev.start) - 1)
            } else {
                (i64::from(prev.end) + 1, i64::from(next.start) - 1)
            };
            Intron {
                start: clamp_position(start),
                end: clamp_position(end),
                index: index as u32,
                rev_index: (count - index - 2) as u32,
                phase: prev.end_phase,
                length_phase: (end - start + 1).rem_euclid(3) as u8,
                intron_type_id: intron_type_id(prev.start_phase, prev.end_phase, next.end_phase),
                prev_exon: index,
                next_exon: index + 1,
                origin: String::new(),
                start_dinucleotide: String::new(),
                end_dinucleotide: String::new(),
                warning_in_start_dinucleotide: false,
                warning_in_end_dinucleotide: false,
                error_main: false,
                warning_n_in_sequence: false,
                from_main_isoform: false,
            }
        })
        .collect()
}

/// Classification code in `[1, 27]` from the phases around an intron.
#[must_use]
pub fn intron_type_id(prev_start_phase: u8, prev_end_phase: u8, next_end_phase: u8) -> u8 {
    1 + 9 * (prev_start_phase % 3) + 3 * (prev_end_phase % 3) + next_end_phase % 3
}

fn clamp_position(position: i64) -> u32 {
    position.clamp(0, i64::from(u32::MAX)) as u32
}

/// Tag the isoforms with the most introns, and their exons and introns, as main.
pub fn tag_main_isoforms(gene: &mut Gene) {
    let max = gene
        .isoforms
        .iter()
        .map(|iso| iso.introns.len())
        .max()
        .unwrap_or(0);
    gene.max_introns_count = max as u32;

    for isoform in &mut gene.isoforms {
        let main = isoform.introns.len() == max;
        isoform.is_maximum_by_introns = main;
        for exon in &mut isoform.exons {
            exon.from_main_isoform = main;
        }
        for intron in &mut isoform.introns {
            intron.from_main_isoform = main;
        }
    }
}
