use crate::nucleotide::NUCLEOTIDES;
use std::collections::BTreeMap;

/// Every `ACGT` trinucleotide in lexicographic order
pub fn trinucleotides() -> impl Iterator<Item = [u8; 3]> {
    NUCLEOTIDES.iter().flat_map(|a| {
        NUCLEOTIDES
            .iter()
            .flat_map(move |b| NUCLEOTIDES.iter().map(move |c| [*a, *b, *c]))
    })
}

/// Occurrences of each trinucleotide in the sequence. Occurrences are counted left to right
/// without overlap, so `AAAA` holds a single `AAA`.
pub fn motif_counts(seq: &[u8]) -> BTreeMap<String, usize> {
    trinucleotides().fold(BTreeMap::new(), |mut motif_counts, motif| {
        let name = motif.iter().map(|nuc| *nuc as char).collect::<String>();
        motif_counts.insert(name, count_non_overlapping(seq, &motif));
        motif_counts
    })
}

fn count_non_overlapping(seq: &[u8], motif: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i + motif.len() <= seq.len() {
        if &seq[i..i + motif.len()] == motif {
            count += 1;
            i += motif.len();
        } else {
            i += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_motifs_present() {
        let counts = motif_counts(b"");
        assert_eq!(counts.len(), 64);
        assert!(counts.values().all(|count| *count == 0));
        assert_eq!(counts.keys().next().map(String::as_str), Some("AAA"));
    }

    #[test]
    fn test_non_overlapping() {
        let counts = motif_counts(b"AAAAGCGCG");
        assert_eq!(counts["AAA"], 1);
        assert_eq!(counts["GCG"], 1);
        assert_eq!(counts["CGC"], 1);
        assert_eq!(counts["AAG"], 1);
    }

    #[test]
    fn test_total_bounded_by_windows() {
        let seq = b"CCTCAGATCACTCTTTGGCAACGACCCCTCGTCACAATAAAGATAGGGGGGCAACTAAAGG";
        let total: usize = motif_counts(seq).values().sum();
        assert!(total <= seq.len() - 2);
        assert!(total > 0);
    }
}
