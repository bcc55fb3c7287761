//! Nucleotide alphabet shared by the extractor and the matrices.

/// Nucleotide alphabet used for matrix rows, in row order
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];
/// Ambiguous base call
pub const AMBIGUOUS: u8 = b'N';
/// Consensus value written upstream when no consensus could be called for a barcode
pub const NO_CONSENSUS: &[u8] = b"None";

/// Checks if the symbol is one of `A`, `C`, `G`, `T` or `N`
pub fn is_recognised(nuc: u8) -> bool {
    matches!(nuc, b'A' | b'C' | b'G' | b'T' | b'N')
}

/// Row of the nucleotide in a count matrix, `None` for anything outside `ACGT`
pub fn index(nuc: u8) -> Option<usize> {
    match nuc {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Checks if the consensus is the upstream "no consensus" marker
pub fn is_no_consensus(seq: &[u8]) -> bool {
    seq == NO_CONSENSUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_follows_row_order() {
        for (i, nuc) in NUCLEOTIDES.iter().enumerate() {
            assert_eq!(index(*nuc), Some(i));
        }
        assert_eq!(index(b'N'), None);
        assert_eq!(index(b'a'), None);
    }

    #[test]
    fn test_recognised() {
        assert!(b"ACGTN".iter().all(|n| is_recognised(*n)));
        assert!(!is_recognised(b'X'));
        assert!(!is_recognised(b'-'));
    }
}
