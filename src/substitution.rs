use crate::error::Error;
use crate::nucleotide::{self, AMBIGUOUS};
use crate::Result;
use std::fmt;
use std::str::FromStr;

/// Single base difference between a consensus read and the reference
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Substitution {
    /// 1-based site in the reference
    pub position: usize,
    /// Reference (wildtype) base
    pub reference: u8,
    /// Base observed in the read
    pub observed: u8,
}

impl Substitution {
    /// Checks if the change is the APOBEC3 signature `G -> A`
    pub fn is_g_to_a(&self) -> bool {
        self.reference == b'G' && self.observed == b'A'
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.reference as char, self.position, self.observed as char
        )
    }
}

impl FromStr for Substitution {
    type Err = Error;

    /// Parses the `G12A` form
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() < 3 || !s.is_ascii() {
            return Err(Error::BadSubstitution(s.to_string()));
        }
        let reference = bytes[0];
        let observed = bytes[bytes.len() - 1];
        let position = s[1..s.len() - 1]
            .parse::<usize>()
            .map_err(|_| Error::BadSubstitution(s.to_string()))?;

        if position == 0
            || reference == observed
            || nucleotide::index(reference).is_none()
            || nucleotide::index(observed).is_none()
        {
            return Err(Error::BadSubstitution(s.to_string()));
        }

        Ok(Self {
            position,
            reference,
            observed,
        })
    }
}

/// Returns the substitutions of `mutant` relative to `reference` in ascending site order.
///
/// Sites where the mutant carries an `N` are ignored, as are sites where the reference base
/// equals `mask` when one is given. The upstream "no consensus" marker yields no
/// substitutions rather than a comparison.
pub fn extract_substitutions(
    mutant: &[u8],
    reference: &[u8],
    mask: Option<u8>,
) -> Result<Vec<Substitution>> {
    if nucleotide::is_no_consensus(mutant) {
        return Ok(Vec::new());
    }
    if mutant.len() != reference.len() {
        return Err(Error::LengthMismatch {
            mutant: mutant.len(),
            reference: reference.len(),
        });
    }

    let mut subs = Vec::new();
    for (i, (&mt, &wt)) in mutant.iter().zip(reference.iter()).enumerate() {
        if mt == AMBIGUOUS || mask.map_or(false, |masked| wt == masked) {
            continue;
        }
        for &nuc in &[wt, mt] {
            if !nucleotide::is_recognised(nuc) {
                return Err(Error::InvalidSymbol {
                    symbol: nuc as char,
                    position: i + 1,
                });
            }
        }
        if wt != AMBIGUOUS && wt != mt {
            subs.push(Substitution {
                position: i + 1,
                reference: wt,
                observed: mt,
            });
        }
    }
    Ok(subs)
}

/// Joins substitutions into the space delimited form `A1G C5T`
pub fn to_mutation_string(subs: &[Substitution]) -> String {
    subs.iter()
        .map(|sub| sub.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the space delimited form written by [`to_mutation_string`]
pub fn parse_mutation_string(s: &str) -> Result<Vec<Substitution>> {
    s.split_whitespace().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(position: usize, observed: u8, reference: u8) -> Substitution {
        Substitution {
            position,
            reference,
            observed,
        }
    }

    #[test]
    fn test_identical_sequences() {
        let seq = b"ACGTTGCAACGT";
        assert!(extract_substitutions(seq, seq, None).unwrap().is_empty());
    }

    #[test]
    fn test_single_site() {
        let subs = extract_substitutions(b"AGT", b"TGT", None).unwrap();
        assert_eq!(subs, vec![sub(1, b'A', b'T')]);
    }

    #[test]
    fn test_two_sites() {
        let subs = extract_substitutions(b"AAGTAACGA", b"ATCTAACGA", None).unwrap();
        assert_eq!(subs, vec![sub(2, b'A', b'T'), sub(3, b'G', b'C')]);
    }

    #[test]
    fn test_mutant_n_is_skipped() {
        let subs = extract_substitutions(b"TGNC", b"AGTC", None).unwrap();
        assert_eq!(subs, vec![sub(1, b'T', b'A')]);
    }

    #[test]
    fn test_reference_n_is_not_recorded() {
        let subs = extract_substitutions(b"AGTC", b"NGTA", None).unwrap();
        assert_eq!(subs, vec![sub(4, b'C', b'A')]);
    }

    #[test]
    fn test_length_mismatch() {
        match extract_substitutions(b"ACG", b"ACGT", None) {
            Err(Error::LengthMismatch { mutant, reference }) => {
                assert_eq!((mutant, reference), (3, 4))
            }
            other => panic!("Expected length mismatch but got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_symbol() {
        match extract_substitutions(b"ACXT", b"ACGT", None) {
            Err(Error::InvalidSymbol { symbol, position }) => {
                assert_eq!((symbol, position), ('X', 3))
            }
            other => panic!("Expected invalid symbol but got {:?}", other),
        }
        assert!(extract_substitutions(b"ACGT", b"AC-T", None).is_err());
    }

    #[test]
    fn test_mask_reference_base() {
        let subs = extract_substitutions(b"AAAAT", b"GGCAA", Some(b'G')).unwrap();
        assert_eq!(subs, vec![sub(3, b'A', b'C'), sub(5, b'T', b'A')]);
    }

    #[test]
    fn test_no_consensus_marker() {
        assert!(extract_substitutions(b"None", b"ACGTACGT", None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mutation_string() {
        let subs = extract_substitutions(b"AAGTAACGA", b"ATCTAACGA", None).unwrap();
        let s = to_mutation_string(&subs);
        assert_eq!(s, "T2A C3G");
        assert_eq!(parse_mutation_string(&s).unwrap(), subs);
        assert!(parse_mutation_string("").unwrap().is_empty());
        assert!(parse_mutation_string("G0A").is_err());
        assert!(parse_mutation_string("GxA").is_err());
        assert!(parse_mutation_string("G5G").is_err());
    }

    #[test]
    fn test_g_to_a() {
        assert!(sub(4, b'A', b'G').is_g_to_a());
        assert!(!sub(4, b'G', b'A').is_g_to_a());
    }
}
