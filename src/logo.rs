//! Background-corrected information content of context matrices.
//!
//! Frequencies are corrected against a negative control (type 2 logo) and letter heights are
//! then scaled by the information content of the corrected column (type 1 logo).

use crate::error::Error;
use crate::matrix::{CountMatrix, ProbabilityMatrix, SITES};
use crate::nucleotide::NUCLEOTIDES;
use crate::Result;
use log::debug;

/// Maximum entropy in bits of a column over four nucleotides
pub const MAX_ENTROPY: f64 = 2.0;
/// Default pseudocount added to each background cell
pub const DEFAULT_PSEUDOCOUNT: f64 = 1.0;

const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Matrices derived for one sample, laid out as `[site][nucleotide]`
#[derive(Debug, Clone, PartialEq)]
pub struct LogoMatrices {
    /// Pseudocount stabilised sample probabilities
    pub ppm: ProbabilityMatrix,
    /// Sample probabilities divided by the background and renormalised
    pub corrected: ProbabilityMatrix,
    /// Shannon entropy of each corrected column
    pub entropy: [f64; 3],
    /// `MAX_ENTROPY - entropy` of each column
    pub information: [f64; 3],
    /// Corrected probability scaled by the column information
    pub heights: [[f64; 4]; 3],
}

/// Background probabilities: pseudocount added to every cell before normalising
pub fn background_ppm(background: &CountMatrix, pseudocount: f64) -> ProbabilityMatrix {
    ProbabilityMatrix::normalize(background.with_pseudocounts([pseudocount; 3]))
}

/// Sample probabilities with a pseudocount scaled by the ratio of the sample column sum to the
/// pseudocount-inclusive background column sum. A column with no counts gets the plain
/// `pseudocount` instead, which makes it uniform.
pub fn sample_ppm(sample: &CountMatrix, background: &CountMatrix, pseudocount: f64) -> ProbabilityMatrix {
    let sample_sums = sample.column_sums();
    let background_sums = background.column_sums();

    let mut extra = [0.0; 3];
    for (site, add) in extra.iter_mut().enumerate() {
        let background_total = background_sums[site] as f64 + 4.0 * pseudocount;
        *add = if sample_sums[site] == 0 {
            pseudocount
        } else {
            sample_sums[site] as f64 / background_total
        };
    }
    debug!("Scaled pseudocounts per site: {:?}", extra);
    ProbabilityMatrix::normalize(sample.with_pseudocounts(extra))
}

/// Shannon entropy in bits, `0 * log2(0)` taken as `0`
pub fn entropy(column: &[f64; 4]) -> Result<f64> {
    entropy_at(column, 0)
}

fn entropy_at(column: &[f64; 4], site: i8) -> Result<f64> {
    column
        .iter()
        .zip(NUCLEOTIDES.iter())
        .try_fold(0.0, |entropy, (p, nuc)| {
            if !p.is_finite() || *p < 0.0 || *p > 1.0 + PROBABILITY_TOLERANCE {
                return Err(Error::Domain {
                    value: *p,
                    site,
                    nuc: *nuc as char,
                });
            }
            if *p > 0.0 {
                Ok(entropy - p * p.log2())
            } else {
                Ok(entropy)
            }
        })
}

/// Computes background-corrected letter heights of a sample.
///
/// Fails with [`Error::Domain`] when a corrected column is not a probability distribution, in
/// which case no heights should be reported for the sample.
pub fn compute_heights(
    sample: &CountMatrix,
    background: &CountMatrix,
    pseudocount: f64,
) -> Result<LogoMatrices> {
    let background_ppm = background_ppm(background, pseudocount);
    let ppm = sample_ppm(sample, background, pseudocount);
    let corrected = ppm.corrected_by(&background_ppm);

    let mut entropy = [0.0; 3];
    let mut information = [0.0; 3];
    let mut heights = [[0.0; 4]; 3];
    for (i, column) in corrected.columns().iter().enumerate() {
        entropy[i] = entropy_at(column, SITES[i])?;
        information[i] = MAX_ENTROPY - entropy[i];
        for (height, p) in heights[i].iter_mut().zip(column.iter()) {
            *height = p * information[i];
        }
    }

    Ok(LogoMatrices {
        ppm,
        corrected,
        entropy,
        information,
        heights,
    })
}

/// Log-odds `log2(sample / background)` of the pseudocount stabilised probabilities
pub fn position_weight_matrix(
    sample: &CountMatrix,
    background: &CountMatrix,
    pseudocount: f64,
) -> [[f64; 4]; 3] {
    let background_ppm = background_ppm(background, pseudocount);
    let ppm = sample_ppm(sample, background, pseudocount);
    let mut pwm = [[0.0; 4]; 3];
    for (site, column) in pwm.iter_mut().enumerate() {
        for (nuc, score) in column.iter_mut().enumerate() {
            *score = (ppm.columns()[site][nuc] / background_ppm.columns()[site][nuc]).log2();
        }
    }
    pwm
}
