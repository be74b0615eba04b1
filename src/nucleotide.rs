//! Nucleotide helpers: complements, strand-aware span extraction and codon predicates.
//!
//! All span arguments are 1-based and inclusive, matching GenBank coordinates.

/// Watson-Crick complement of an uppercase base. Anything outside `ACGTN` becomes `N`.
#[must_use]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        _ => b'N',
    }
}

/// Reverse complement of an entire sequence.
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Bases of the span `[low, high]` that lie inside the origin.
fn clipped(origin: &[u8], low: u32, high: u32) -> &[u8] {
    if low == 0 || high < low {
        return &[];
    }
    let from = (low as usize - 1).min(origin.len());
    let to = (high as usize).min(origin.len());
    &origin[from..to]
}

/// Reverse complement of the origin span `[start, end]`, clipped to the origin.
///
/// The bounds may be given in either order.
#[must_use]
pub fn reverse_complement_span(origin: &[u8], start: u32, end: u32) -> Vec<u8> {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    reverse_complement(clipped(origin, low, high))
}

/// Forward-strand substring of the origin span `[start, end]`, clipped to the origin.
#[must_use]
pub fn forward_span(origin: &[u8], start: u32, end: u32) -> Vec<u8> {
    clipped(origin, start, end).to_vec()
}

/// True when the base is not one of the four unambiguous nucleotides.
#[must_use]
pub fn is_ambiguous(base: u8) -> bool {
    !matches!(base, b'A' | b'C' | b'G' | b'T')
}

#[must_use]
pub fn has_ambiguous(seq: &[u8]) -> bool {
    seq.iter().any(|&b| is_ambiguous(b))
}

/// True for the standard stop codons `TAA`, `TAG` and `TGA`.
#[must_use]
pub fn is_stop_codon(codon: &[u8]) -> bool {
    matches!(codon, b"TAA" | b"TAG" | b"TGA")
}

/// First `n` bases of a sequence (or all of it when shorter).
#[must_use]
pub fn head(seq: &[u8], n: usize) -> &[u8] {
    &seq[..n.min(seq.len())]
}

/// Last `n` bases of a sequence (or all of it when shorter).
#[must_use]
pub fn tail(seq: &[u8], n: usize) -> &[u8] {
    &seq[seq.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_pairs() {
        assert_eq!(complement(b'A'), b'T');
        assert_eq!(complement(b'T'), b'A');
        assert_eq!(complement(b'G'), b'C');
        assert_eq!(complement(b'C'), b'G');
        assert_eq!(complement(b'N'), b'N');
        assert_eq!(complement(b'R'), b'N');
    }

    #[test]
    fn double_reverse_complement_is_identity() {
        let seq = b"ATGCNNGATTACA";
        assert_eq!(reverse_complement(&reverse_complement(seq)), seq.to_vec());
    }

    #[test]
    fn non_acgtn_collapses_to_n() {
        let once = reverse_complement(b"AYRT");
        assert_eq!(once, b"ANNT");
        assert_eq!(reverse_complement(&once), b"ANNT");
    }

    #[test]
    fn span_reverse_complement() {
        //            123456789
        let origin = b"AACCGGTTA";
        assert_eq!(reverse_complement_span(origin, 3, 6), b"CCGG");
        assert_eq!(reverse_complement_span(origin, 6, 3), b"CCGG");
        assert_eq!(reverse_complement_span(origin, 1, 2), b"TT");
        assert_eq!(reverse_complement_span(origin, 8, 9), b"TA");
    }

    #[test]
    fn span_reverse_complement_round_trip() {
        let origin = b"GATTACANGC";
        let once = reverse_complement_span(origin, 2, 9);
        let twice = reverse_complement_span(&once, 1, once.len() as u32);
        assert_eq!(twice, &origin[1..9]);
    }

    #[test]
    fn spans_are_clipped_on_both_strands() {
        assert_eq!(forward_span(b"ACGT", 3, 6), b"GT");
        assert_eq!(reverse_complement_span(b"ACGT", 3, 6), b"AC");
        assert!(forward_span(b"ACG", 0, 2).is_empty());
        assert!(forward_span(b"", 1, 20).is_empty());
        assert!(reverse_complement_span(b"", 1, 20).is_empty());
        assert!(reverse_complement_span(b"ACG", 10, 12).is_empty());
    }

    #[test]
    fn stop_codons() {
        assert!(is_stop_codon(b"TAA"));
        assert!(is_stop_codon(b"TAG"));
        assert!(is_stop_codon(b"TGA"));
        assert!(!is_stop_codon(b"TGG"));
        assert!(!is_stop_codon(b"TA"));
    }

    #[test]
    fn ambiguity() {
        assert!(!has_ambiguous(b"ACGT"));
        assert!(has_ambiguous(b"ACNT"));
        assert!(has_ambiguous(b"ACRT"));
    }

    #[test]
    fn head_and_tail() {
        assert_eq!(head(b"ATGAAA", 3), b"ATG");
        assert_eq!(tail(b"ATGAAA", 3), b"AAA");
        assert_eq!(head(b"AT", 3), b"AT");
        assert_eq!(tail(b"AT", 3), b"AT");
    }
}
