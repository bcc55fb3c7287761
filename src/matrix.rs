//! Position frequency and probability matrices over the `(5', substituted, 3')` context.
//!
//! Columns are the relative sites `-1`, `0` and `1`, rows the nucleotides `A`, `C`, `G`, `T`.

use crate::nucleotide::{self, NUCLEOTIDES};
use crate::summary::{ReadSummary, SubstitutionContext};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Relative sites of the matrix columns
pub const SITES: [i8; 3] = [-1, 0, 1];

/// Which base of a substitution occupies site `0`
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CenterBase {
    /// Base found in the reference (motif of the targeted base)
    Reference,
    /// Base found in the read (motif of the induced mutation)
    Observed,
}

impl CenterBase {
    fn pick(self, ctx: &SubstitutionContext) -> u8 {
        match self {
            CenterBase::Reference => ctx.substitution.reference,
            CenterBase::Observed => ctx.substitution.observed,
        }
    }
}

impl FromStr for CenterBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" | "ref" => Ok(CenterBase::Reference),
            "observed" | "obs" => Ok(CenterBase::Observed),
            other => Err(format!(
                "Center base must be `reference` or `observed` but got `{}`",
                other
            )),
        }
    }
}

impl fmt::Display for CenterBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CenterBase::Reference => write!(f, "reference"),
            CenterBase::Observed => write!(f, "observed"),
        }
    }
}

/// Which substitutions contribute to a matrix
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ContextSelection {
    /// Every substitution
    All,
    /// Only `G -> A` substitutions
    GToA,
}

impl ContextSelection {
    fn includes(self, ctx: &SubstitutionContext) -> bool {
        match self {
            ContextSelection::All => true,
            ContextSelection::GToA => ctx.substitution.is_g_to_a(),
        }
    }
}

impl FromStr for ContextSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ContextSelection::All),
            "ga" | "g2a" | "gtoa" => Ok(ContextSelection::GToA),
            other => Err(format!(
                "Substitution selection must be `all` or `ga` but got `{}`",
                other
            )),
        }
    }
}

/// Maps a relative site to its column
pub fn site_index(site: i8) -> Option<usize> {
    SITES.iter().position(|s| *s == site)
}

/// Position frequency matrix. The column at site `0` sums to the number of contributing
/// substitutions; flanking columns can be smaller at the reference ends.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct CountMatrix {
    counts: [[u64; 4]; 3],
}

impl CountMatrix {
    /// Matrix from counts laid out as `[site][nucleotide]`
    pub fn new(counts: [[u64; 4]; 3]) -> Self {
        Self { counts }
    }

    /// Tallies the contexts of all substitutions selected in the reads
    pub fn from_summaries<'a, I>(summaries: I, center: CenterBase, selection: ContextSelection) -> Self
    where
        I: IntoIterator<Item = &'a ReadSummary>,
    {
        summaries
            .into_iter()
            .flat_map(|summary| summary.contexts().iter())
            .filter(|ctx| selection.includes(ctx))
            .fold(Self::default(), |mut matrix, ctx| {
                matrix.add_context(ctx, center);
                matrix
            })
    }

    /// Counts one context. Flanks outside `ACGT` (missing at the reference ends or `N`) are
    /// not counted.
    pub fn add_context(&mut self, ctx: &SubstitutionContext, center: CenterBase) {
        let bases = [ctx.five_prime, Some(center.pick(ctx)), ctx.three_prime];
        for (column, base) in self.counts.iter_mut().zip(bases.iter()) {
            if let Some(row) = base.and_then(nucleotide::index) {
                column[row] += 1;
            }
        }
    }

    /// Count at a relative site for a nucleotide
    pub fn get(&self, site: i8, nuc: u8) -> Option<u64> {
        Some(self.counts[site_index(site)?][nucleotide::index(nuc)?])
    }

    /// Counts as `[site][nucleotide]`
    pub fn counts(&self) -> &[[u64; 4]; 3] {
        &self.counts
    }

    /// Total count of each column
    pub fn column_sums(&self) -> [u64; 3] {
        let mut sums = [0; 3];
        for (sum, column) in sums.iter_mut().zip(self.counts.iter()) {
            *sum = column.iter().sum();
        }
        sums
    }

    /// Number of substitutions that contributed to the matrix
    pub fn n_substitutions(&self) -> u64 {
        self.column_sums()[1]
    }

    /// Checks if nothing has been counted
    pub fn is_empty(&self) -> bool {
        self.counts.iter().flatten().all(|count| *count == 0)
    }

    /// Counts as floats with `extra[site]` added to every cell of that column
    pub(crate) fn with_pseudocounts(&self, extra: [f64; 3]) -> [[f64; 4]; 3] {
        let mut values = [[0.0; 4]; 3];
        for ((out, column), add) in values.iter_mut().zip(self.counts.iter()).zip(extra.iter()) {
            for (value, count) in out.iter_mut().zip(column.iter()) {
                *value = *count as f64 + add;
            }
        }
        values
    }
}

impl AddAssign for CountMatrix {
    fn add_assign(&mut self, other: Self) {
        for (column, other_column) in self.counts.iter_mut().zip(other.counts.iter()) {
            for (count, other_count) in column.iter_mut().zip(other_column.iter()) {
                *count += other_count;
            }
        }
    }
}

impl Add for CountMatrix {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for CountMatrix {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a CountMatrix> for CountMatrix {
    fn sum<I: Iterator<Item = &'a CountMatrix>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Position probability matrix, laid out as `[site][nucleotide]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityMatrix {
    probs: [[f64; 4]; 3],
}

impl ProbabilityMatrix {
    /// Divides every column by its sum
    pub fn normalize(values: [[f64; 4]; 3]) -> Self {
        let mut probs = values;
        for column in probs.iter_mut() {
            let total: f64 = column.iter().sum();
            for p in column.iter_mut() {
                *p /= total;
            }
        }
        Self { probs }
    }

    /// Probabilities as `[site][nucleotide]`
    pub fn columns(&self) -> &[[f64; 4]; 3] {
        &self.probs
    }

    /// Probability at a relative site for a nucleotide
    pub fn get(&self, site: i8, nuc: u8) -> Option<f64> {
        Some(self.probs[site_index(site)?][nucleotide::index(nuc)?])
    }

    /// Element-wise `self / other`, each column renormalised to sum to one
    pub fn corrected_by(&self, background: &ProbabilityMatrix) -> Self {
        let mut ratios = [[0.0; 4]; 3];
        for (site, column) in ratios.iter_mut().enumerate() {
            for (nuc, ratio) in column.iter_mut().enumerate() {
                *ratio = self.probs[site][nuc] / background.probs[site][nuc];
            }
        }
        Self::normalize(ratios)
    }
}

/// Iterates `(site, nucleotide, value)` over a `[site][nucleotide]` matrix
pub fn cells<T: Copy>(values: &[[T; 4]; 3]) -> impl Iterator<Item = (i8, u8, T)> + '_ {
    values.iter().zip(SITES.iter()).flat_map(|(column, site)| {
        column
            .iter()
            .zip(NUCLEOTIDES.iter())
            .map(move |(value, nuc)| (*site, *nuc, *value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &[u8] = b"GACGTTAGCG";

    fn summaries(reads: &[&[u8]]) -> Vec<ReadSummary> {
        reads
            .iter()
            .map(|read| ReadSummary::new(read, REFERENCE).unwrap())
            .collect()
    }

    #[test]
    fn test_counts_contexts() {
        // G -> A at 4 (C_T), A -> C at 7 (T_G)
        let reads = summaries(&[b"GACATTCGCG", b"GACATTAGCG"]);
        let pfm = CountMatrix::from_summaries(&reads, CenterBase::Reference, ContextSelection::All);
        assert_eq!(pfm.n_substitutions(), 3);
        assert_eq!(pfm.get(-1, b'C'), Some(2));
        assert_eq!(pfm.get(-1, b'T'), Some(1));
        assert_eq!(pfm.get(0, b'G'), Some(2));
        assert_eq!(pfm.get(0, b'A'), Some(1));
        assert_eq!(pfm.get(1, b'T'), Some(2));
        assert_eq!(pfm.get(1, b'G'), Some(1));
    }

    #[test]
    fn test_center_base_choice() {
        let reads = summaries(&[b"GACATTAGCG"]);
        let by_ref = CountMatrix::from_summaries(&reads, CenterBase::Reference, ContextSelection::All);
        let by_obs = CountMatrix::from_summaries(&reads, CenterBase::Observed, ContextSelection::All);
        assert_eq!(by_ref.get(0, b'G'), Some(1));
        assert_eq!(by_obs.get(0, b'A'), Some(1));
        assert_eq!(by_ref.column_sums(), by_obs.column_sums());
    }

    #[test]
    fn test_ends_have_no_flanks() {
        // G -> A at 1 and 10
        let reads = summaries(&[b"AACGTTAGCA"]);
        let pfm = CountMatrix::from_summaries(&reads, CenterBase::Reference, ContextSelection::All);
        assert_eq!(pfm.column_sums(), [1, 2, 1]);
    }

    #[test]
    fn test_ga_selection() {
        let reads = summaries(&[b"GACATTCGCG"]);
        let pfm = CountMatrix::from_summaries(&reads, CenterBase::Reference, ContextSelection::GToA);
        assert_eq!(pfm.n_substitutions(), 1);
        assert_eq!(pfm.get(0, b'G'), Some(1));
    }

    #[test]
    fn test_no_substitutions_gives_zero_matrix() {
        let reads = summaries(&[REFERENCE, b"None"]);
        let pfm = CountMatrix::from_summaries(&reads, CenterBase::Reference, ContextSelection::All);
        assert!(pfm.is_empty());
        assert_eq!(pfm, CountMatrix::default());
    }

    #[test]
    fn test_replicates_are_summed() {
        let rep1 = CountMatrix::new([[1, 0, 2, 0], [0, 0, 3, 0], [0, 1, 1, 1]]);
        let rep2 = CountMatrix::new([[0, 4, 0, 0], [0, 0, 4, 0], [2, 0, 0, 2]]);
        let summed: CountMatrix = vec![rep1, rep2].iter().sum();
        assert_eq!(summed, rep1 + rep2);
        assert_eq!(summed.counts(), &[[1, 4, 2, 0], [0, 0, 7, 0], [2, 1, 1, 3]]);
        assert_eq!(summed.n_substitutions(), 7);
    }

    #[test]
    fn test_normalize_columns() {
        let ppm = ProbabilityMatrix::normalize([
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 2.0, 2.0],
            [3.0, 1.0, 0.0, 0.0],
        ]);
        for column in ppm.columns() {
            assert!((column.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert_eq!(ppm.get(0, b'G'), Some(0.5));
        assert_eq!(ppm.get(1, b'A'), Some(0.75));
        assert_eq!(ppm.get(-1, b'T'), Some(0.25));
        assert_eq!(ppm.get(2, b'T'), None);
    }

    #[test]
    fn test_center_base_from_str() {
        assert_eq!("Reference".parse::<CenterBase>(), Ok(CenterBase::Reference));
        assert_eq!("observed".parse::<CenterBase>(), Ok(CenterBase::Observed));
        assert!("mutant".parse::<CenterBase>().is_err());
    }
}
