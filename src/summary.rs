use crate::error::Error;
use crate::nucleotide;
use crate::substitution::{extract_substitutions, Substitution};
use crate::Result;
use std::fmt;

/// Reference context of a substitution. Sites at the start of the reference have no 5' base
/// and sites at the end have no 3' base; `window` is only defined when both exist.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SubstitutionContext {
    /// Reference base before the site
    pub five_prime: Option<u8>,
    /// The substitution itself
    pub substitution: Substitution,
    /// Reference base after the site
    pub three_prime: Option<u8>,
    /// Reference trinucleotide centred on the site
    pub window: Option<[u8; 3]>,
}

impl SubstitutionContext {
    /// Looks up the reference neighbours of the substitution
    pub fn new(substitution: Substitution, reference: &[u8]) -> Result<Self> {
        let pos = substitution.position;
        if pos == 0 || pos > reference.len() {
            return Err(Error::BadSubstitution(substitution.to_string()));
        }

        let five_prime = if pos == 1 {
            None
        } else {
            Some(reference[pos - 2])
        };
        let three_prime = if pos == reference.len() {
            None
        } else {
            Some(reference[pos])
        };
        let window = match (five_prime, three_prime) {
            (Some(_), Some(_)) => {
                let mut window = [0; 3];
                window.copy_from_slice(&reference[pos - 2..pos + 1]);
                Some(window)
            }
            _ => None,
        };

        Ok(Self {
            five_prime,
            substitution,
            three_prime,
            window,
        })
    }
}

impl fmt::Display for SubstitutionContext {
    /// Written as `T[G>A]G`, with `.` standing in for a missing neighbour
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flank = |nuc: Option<u8>| nuc.map_or('.', |n| n as char);
        write!(
            f,
            "{}[{}>{}]{}",
            flank(self.five_prime),
            self.substitution.reference as char,
            self.substitution.observed as char,
            flank(self.three_prime)
        )
    }
}

/// Substitutions of one consensus read against the reference
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSummary {
    called: bool,
    substitutions: Vec<Substitution>,
    contexts: Vec<SubstitutionContext>,
}

impl ReadSummary {
    /// Compares the consensus with the reference
    pub fn new(consensus: &[u8], reference: &[u8]) -> Result<Self> {
        if nucleotide::is_no_consensus(consensus) {
            return Ok(Self::no_consensus());
        }
        let substitutions = extract_substitutions(consensus, reference, None)?;
        Self::from_substitutions(substitutions, reference)
    }

    /// Rebuilds a summary from previously extracted substitutions
    pub fn from_substitutions(substitutions: Vec<Substitution>, reference: &[u8]) -> Result<Self> {
        let contexts = substitutions
            .iter()
            .map(|sub| SubstitutionContext::new(*sub, reference))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            called: true,
            substitutions,
            contexts,
        })
    }

    /// Summary of a read for which no consensus was called upstream
    pub fn no_consensus() -> Self {
        Self {
            called: false,
            substitutions: Vec::new(),
            contexts: Vec::new(),
        }
    }

    /// Checks if a consensus was called for the read
    pub fn is_called(&self) -> bool {
        self.called
    }

    /// Substitutions in ascending site order
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// Context of each substitution, in the same order
    pub fn contexts(&self) -> &[SubstitutionContext] {
        &self.contexts
    }

    /// Number of substitutions
    pub fn n_subs(&self) -> usize {
        self.substitutions.len()
    }

    /// Number of `G -> A` substitutions
    pub fn n_ga_subs(&self) -> usize {
        self.substitutions.iter().filter(|sub| sub.is_g_to_a()).count()
    }
}

/// A retained read together with its substitution count inside the quality filter window
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRead {
    /// Barcode of the read
    pub barcode: String,
    /// Substitutions inside the quality filter window
    pub window_subs: usize,
    /// Substitutions over the whole reference
    pub summary: ReadSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &[u8] = b"GACGTTAG";

    #[test]
    fn test_counts() {
        let summary = ReadSummary::new(b"AACATTAA", REFERENCE).unwrap();
        assert_eq!(summary.n_subs(), 3);
        assert_eq!(summary.n_ga_subs(), 3);

        let summary = ReadSummary::new(b"GTCGTTAG", REFERENCE).unwrap();
        assert_eq!(summary.n_subs(), 1);
        assert_eq!(summary.n_ga_subs(), 0);
    }

    #[test]
    fn test_first_site_has_no_five_prime() {
        let summary = ReadSummary::new(b"AACGTTAG", REFERENCE).unwrap();
        let ctx = summary.contexts()[0];
        assert_eq!(ctx.five_prime, None);
        assert_eq!(ctx.three_prime, Some(b'A'));
        assert_eq!(ctx.window, None);
        assert_eq!(ctx.to_string(), ".[G>A]A");
    }

    #[test]
    fn test_last_site_has_no_three_prime() {
        let summary = ReadSummary::new(b"GACGTTAA", REFERENCE).unwrap();
        let ctx = summary.contexts()[0];
        assert_eq!(ctx.five_prime, Some(b'A'));
        assert_eq!(ctx.three_prime, None);
        assert_eq!(ctx.window, None);
    }

    #[test]
    fn test_interior_window_is_reference_slice() {
        let summary = ReadSummary::new(b"GACATTAG", REFERENCE).unwrap();
        let ctx = summary.contexts()[0];
        assert_eq!(ctx.substitution.position, 4);
        assert_eq!(ctx.five_prime, Some(b'C'));
        assert_eq!(ctx.three_prime, Some(b'T'));
        assert_eq!(&ctx.window.unwrap(), &REFERENCE[2..5]);
        assert_eq!(ctx.to_string(), "C[G>A]T");
    }

    #[test]
    fn test_no_consensus() {
        let summary = ReadSummary::new(b"None", REFERENCE).unwrap();
        assert!(!summary.is_called());
        assert_eq!(summary.n_subs(), 0);
        assert!(summary.contexts().is_empty());
    }

    #[test]
    fn test_rebuild_from_substitutions() {
        let summary = ReadSummary::new(b"AACATTAA", REFERENCE).unwrap();
        let rebuilt =
            ReadSummary::from_substitutions(summary.substitutions().to_vec(), REFERENCE).unwrap();
        assert_eq!(summary, rebuilt);
    }

    #[test]
    fn test_site_outside_reference() {
        let sub = Substitution {
            position: 9,
            reference: b'G',
            observed: b'A',
        };
        assert!(ReadSummary::from_substitutions(vec![sub], REFERENCE).is_err());
    }
}
