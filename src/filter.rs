//! Removal of reads misaligned in the overlap between `R1` and `R2`.
//!
//! Such reads pile up substitutions in the middle of the amplicon. The filter counts
//! substitutions inside a window expected to be alignment-stable, ignoring sites where the
//! reference carries the hypermutated base, and drops reads above a threshold.

use crate::error::Error;
use crate::nucleotide;
use crate::substitution::extract_substitutions;
use crate::summary::AnnotatedRead;
use crate::Result;
use log::debug;
use std::ops::Range;

/// Window start used in the original assay
pub const DEFAULT_WINDOW_START: usize = 130;
/// Window end (exclusive) used in the original assay
pub const DEFAULT_WINDOW_END: usize = 170;
/// Reference base masked inside the window
pub const DEFAULT_MASK: u8 = b'G';
/// Maximum substitutions allowed inside the window
pub const DEFAULT_MAX_SUBS: usize = 3;

/// Window based misalignment filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityFilter {
    /// 0-based, end exclusive window on the reference
    pub window: Range<usize>,
    /// Reference base whose sites are not counted
    pub mask: Option<u8>,
    /// Reads with more window substitutions than this fail
    pub max_subs: usize,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_START..DEFAULT_WINDOW_END,
            mask: Some(DEFAULT_MASK),
            max_subs: DEFAULT_MAX_SUBS,
        }
    }
}

impl QualityFilter {
    /// Filter over the `window` of the reference
    pub fn new(window: Range<usize>, mask: Option<u8>, max_subs: usize) -> Self {
        Self {
            window,
            mask,
            max_subs,
        }
    }

    /// Checks that the window is ordered and lies within the reference
    pub fn check_window(&self, reference: &[u8]) -> Result<()> {
        let Range { start, end } = self.window;
        if start > end || end > reference.len() {
            return Err(Error::InvalidWindow {
                start,
                end,
                reference: reference.len(),
            });
        }
        Ok(())
    }

    /// Counts masked substitutions of the consensus inside the window. A consensus ending
    /// before the window is a [`Error::LengthMismatch`].
    pub fn window_substitutions(&self, consensus: &[u8], reference: &[u8]) -> Result<usize> {
        self.check_window(reference)?;
        if nucleotide::is_no_consensus(consensus) {
            return Ok(0);
        }
        let Range { start, end } = self.window;
        if end > consensus.len() {
            return Err(Error::LengthMismatch {
                mutant: consensus.len(),
                reference: reference.len(),
            });
        }

        let subs = extract_substitutions(
            &consensus[start..end],
            &reference[start..end],
            self.mask,
        )?;
        Ok(subs.len())
    }

    /// Checks if the read is within the allowed number of window substitutions
    pub fn passes(&self, consensus: &[u8], reference: &[u8]) -> Result<bool> {
        Ok(self.accepts(self.window_substitutions(consensus, reference)?))
    }

    /// Checks a previously computed window substitution count
    pub fn accepts(&self, window_subs: usize) -> bool {
        window_subs <= self.max_subs
    }

    /// Keeps the reads whose stored window count passes. Retained reads pass again, so
    /// applying the filter to its own output changes nothing.
    pub fn retain(&self, reads: Vec<AnnotatedRead>) -> Vec<AnnotatedRead> {
        let before = reads.len();
        let retained = reads
            .into_iter()
            .filter(|read| self.accepts(read.window_subs))
            .collect::<Vec<_>>();
        debug!(
            "Quality filter kept {} of {} reads (max {} substitutions in {:?})",
            retained.len(),
            before,
            self.max_subs,
            self.window
        );
        retained
    }
}

/// Checks if a read has at most `max_subs` substitutions in `[window_start, window_end)`
/// after masking reference sites equal to `mask`
pub fn passes_filter(
    consensus: &[u8],
    reference: &[u8],
    window_start: usize,
    window_end: usize,
    mask: Option<u8>,
    max_subs: usize,
) -> Result<bool> {
    QualityFilter::new(window_start..window_end, mask, max_subs).passes(consensus, reference)
}
