//! Read-level substitution statistics of a sample.
//!
//! Counts are summed across technical replicates; percentages are derived from the sums.

use crate::summary::ReadSummary;
use std::iter::Sum;
use std::ops::Add;

/// Number of G-to-A histogram bins, `0` to `9` and a final `10+`
pub const HISTOGRAM_BINS: usize = 11;

/// What happened to the reads of a sample before aggregation
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ReadTally {
    /// Reads that could be compared to the reference
    pub annotated: usize,
    /// Reads dropped because they could not be compared
    pub skipped: usize,
    /// Reads removed by the quality filter
    pub failed_filter: usize,
    /// Reads passing the filter without a called consensus
    pub no_consensus: usize,
}

impl Add for ReadTally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            annotated: self.annotated + other.annotated,
            skipped: self.skipped + other.skipped,
            failed_filter: self.failed_filter + other.failed_filter,
            no_consensus: self.no_consensus + other.no_consensus,
        }
    }
}

impl Sum for ReadTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Reads with at least one and with more than one substitution
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ReadCounts {
    /// Reads with a called consensus
    pub total_reads: u64,
    /// Reads with any substitution
    pub reads_with_subs: u64,
    /// Reads with two or more substitutions
    pub reads_with_multiple_subs: u64,
    /// Reads with a `G -> A` substitution
    pub reads_with_ga_subs: u64,
    /// Reads with two or more `G -> A` substitutions
    pub reads_with_multiple_ga_subs: u64,
}

impl ReadCounts {
    /// Tallies reads for which a consensus was called
    pub fn from_summaries<'a, I>(summaries: I) -> Self
    where
        I: IntoIterator<Item = &'a ReadSummary>,
    {
        summaries
            .into_iter()
            .filter(|summary| summary.is_called())
            .fold(Self::default(), |mut counts, summary| {
                let (n, n_ga) = (summary.n_subs(), summary.n_ga_subs());
                counts.total_reads += 1;
                counts.reads_with_subs += (n > 0) as u64;
                counts.reads_with_multiple_subs += (n > 1) as u64;
                counts.reads_with_ga_subs += (n_ga > 0) as u64;
                counts.reads_with_multiple_ga_subs += (n_ga > 1) as u64;
                counts
            })
    }

    /// Percentage of all reads, rounded to two decimals
    pub fn percent(&self, reads: u64) -> f64 {
        percent(reads, self.total_reads)
    }
}

impl Add for ReadCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total_reads: self.total_reads + other.total_reads,
            reads_with_subs: self.reads_with_subs + other.reads_with_subs,
            reads_with_multiple_subs: self.reads_with_multiple_subs + other.reads_with_multiple_subs,
            reads_with_ga_subs: self.reads_with_ga_subs + other.reads_with_ga_subs,
            reads_with_multiple_ga_subs: self.reads_with_multiple_ga_subs
                + other.reads_with_multiple_ga_subs,
        }
    }
}

impl Sum for ReadCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Reads binned by their number of `G -> A` substitutions
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct GaHistogram {
    bins: [u64; HISTOGRAM_BINS],
}

impl GaHistogram {
    /// Bins reads for which a consensus was called
    pub fn from_summaries<'a, I>(summaries: I) -> Self
    where
        I: IntoIterator<Item = &'a ReadSummary>,
    {
        summaries
            .into_iter()
            .filter(|summary| summary.is_called())
            .fold(Self::default(), |mut histogram, summary| {
                let bin = summary.n_ga_subs().min(HISTOGRAM_BINS - 1);
                histogram.bins[bin] += 1;
                histogram
            })
    }

    /// Read counts of the bins, the last one holding `10+`
    pub fn bins(&self) -> &[u64; HISTOGRAM_BINS] {
        &self.bins
    }

    /// Total number of binned reads
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// `(label, count, percent of reads)` for every bin
    pub fn rows(&self) -> impl Iterator<Item = (String, u64, f64)> + '_ {
        let total = self.total();
        self.bins.iter().enumerate().map(move |(i, count)| {
            let label = if i == HISTOGRAM_BINS - 1 {
                format!("{}+", i)
            } else {
                i.to_string()
            };
            (label, *count, percent(*count, total))
        })
    }
}

impl Add for GaHistogram {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        for (bin, other_bin) in self.bins.iter_mut().zip(other.bins.iter()) {
            *bin += other_bin;
        }
        self
    }
}

impl Sum for GaHistogram {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 10_000.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &[u8] = b"GGGGGGGGGGGGGGCT";

    fn summaries(reads: &[&[u8]]) -> Vec<ReadSummary> {
        reads
            .iter()
            .map(|read| ReadSummary::new(read, REFERENCE).unwrap())
            .collect()
    }

    #[test]
    fn test_read_counts() {
        let reads = summaries(&[
            REFERENCE,
            b"AGGGGGGGGGGGGGCT",
            b"AAGGGGGGGGGGGGCT",
            b"GGGGGGGGGGGGGGCA",
            b"None",
        ]);
        let counts = ReadCounts::from_summaries(&reads);
        assert_eq!(
            counts,
            ReadCounts {
                total_reads: 4,
                reads_with_subs: 3,
                reads_with_multiple_subs: 1,
                reads_with_ga_subs: 2,
                reads_with_multiple_ga_subs: 1,
            }
        );
        assert_eq!(counts.percent(counts.reads_with_subs), 75.0);
        assert_eq!(ReadCounts::default().percent(0), 0.0);
    }

    #[test]
    fn test_replicate_percent_from_sums() {
        let rep1 = ReadCounts {
            total_reads: 3,
            reads_with_subs: 1,
            ..Default::default()
        };
        let rep2 = ReadCounts {
            total_reads: 1,
            reads_with_subs: 1,
            ..Default::default()
        };
        let summed: ReadCounts = vec![rep1, rep2].into_iter().sum();
        assert_eq!(summed.percent(summed.reads_with_subs), 50.0);
        assert_eq!(rep1.percent(rep1.reads_with_subs), 33.33);
    }

    #[test]
    fn test_tallies_sum() {
        let rep1 = ReadTally {
            annotated: 10,
            skipped: 1,
            failed_filter: 2,
            no_consensus: 3,
        };
        let rep2 = ReadTally {
            annotated: 5,
            skipped: 0,
            failed_filter: 1,
            no_consensus: 0,
        };
        assert_eq!(
            vec![rep1, rep2].into_iter().sum::<ReadTally>(),
            ReadTally {
                annotated: 15,
                skipped: 1,
                failed_filter: 3,
                no_consensus: 3,
            }
        );
    }

    #[test]
    fn test_histogram_bins_sum_to_reads() {
        let reads = summaries(&[
            REFERENCE,
            b"AGGGGGGGGGGGGGCT",
            b"AAAAAAAAAAAAGGCT",
            b"AAAAAAAAAAAAAACT",
            b"None",
        ]);
        let histogram = GaHistogram::from_summaries(&reads);
        assert_eq!(histogram.total(), ReadCounts::from_summaries(&reads).total_reads);
        assert_eq!(histogram.bins()[0], 1);
        assert_eq!(histogram.bins()[1], 1);
        assert_eq!(histogram.bins()[10], 2);

        let rows = histogram.rows().collect::<Vec<_>>();
        assert_eq!(rows.len(), HISTOGRAM_BINS);
        assert_eq!(rows[10], ("10+".to_string(), 2, 50.0));
    }
}
