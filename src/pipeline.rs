//! Per-sample analysis and the combination of replicates.
//!
//! Every stage returns its results; nothing is accumulated in shared state. Samples are
//! independent until replicates are combined and are processed in parallel.

use crate::error::Error;
use crate::filter::QualityFilter;
use crate::io::{self, ConsensusRow};
use crate::logo::{self, compute_heights, LogoMatrices, DEFAULT_PSEUDOCOUNT};
use crate::matrix::{CenterBase, ContextSelection, CountMatrix};
use crate::motif::motif_counts;
use crate::stats::{GaHistogram, ReadCounts, ReadTally};
use crate::summary::{AnnotatedRead, ReadSummary};
use crate::Result;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Negative control used as background in the original assay
pub const DEFAULT_BACKGROUND: &str = "NoA3";
/// Directory, below the output directory, holding the per-sample mutation tables
pub const MUTINFO_DIR: &str = "mutinfo";

/// Settings shared by all samples of a run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Misalignment filter applied to every sample
    pub filter: QualityFilter,
    /// Base placed at the center of the context matrix
    pub center: CenterBase,
    /// Substitutions counted in the context matrix
    pub selection: ContextSelection,
    /// Pseudocount added to each background cell
    pub pseudocount: f64,
    /// Sample or replicate group used as background
    pub background: String,
    /// Remake mutation tables that already exist
    pub overwrite: bool,
}

impl AnalysisConfig {
    /// Defaults of the original assay with the given center base
    pub fn new(center: CenterBase) -> Self {
        Self {
            filter: QualityFilter::default(),
            center,
            selection: ContextSelection::All,
            pseudocount: DEFAULT_PSEUDOCOUNT,
            background: DEFAULT_BACKGROUND.to_string(),
            overwrite: false,
        }
    }
}

/// Compares one consensus row with the reference
pub fn annotate_read(
    row: &ConsensusRow,
    reference: &[u8],
    filter: &QualityFilter,
) -> Result<AnnotatedRead> {
    let consensus = row.consensus.as_bytes();
    Ok(AnnotatedRead {
        barcode: row.barcode.clone(),
        window_subs: filter.window_substitutions(consensus, reference)?,
        summary: ReadSummary::new(consensus, reference)?,
    })
}

/// Annotates the rows of a sample in one pass. Reads that cannot be compared are logged and
/// skipped, any other error ends the sample.
pub fn annotate_reads<I>(
    sample: &str,
    rows: I,
    reference: &[u8],
    filter: &QualityFilter,
) -> Result<(Vec<AnnotatedRead>, usize)>
where
    I: IntoIterator<Item = Result<ConsensusRow>>,
{
    let mut reads = Vec::new();
    let mut skipped = 0;
    for row in rows {
        let row = row?;
        match annotate_read(&row, reference, filter) {
            Ok(read) => reads.push(read),
            Err(e @ Error::LengthMismatch { .. }) | Err(e @ Error::InvalidSymbol { .. }) => {
                warn!(
                    "Skipping read with barcode `{}` of sample {}: {}",
                    row.barcode, sample, e
                );
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(
        "Annotated {} reads of sample {} ({} skipped)",
        reads.len(),
        sample,
        skipped
    );
    Ok((reads, skipped))
}

/// Filtered read statistics and context counts of one sequenced sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAnalysis {
    /// Sample name, replicate suffix included
    pub name: String,
    /// Reads skipped, filtered out or without consensus
    pub tally: ReadTally,
    /// Substitution counts of the reads passing the filter
    pub counts: ReadCounts,
    /// `G -> A` histogram of the reads passing the filter
    pub histogram: GaHistogram,
    /// Context counts of the reads passing the filter
    pub pfm: CountMatrix,
}

impl SampleAnalysis {
    /// Applies the quality filter once and aggregates the reads that pass
    pub fn new(name: &str, reads: Vec<AnnotatedRead>, skipped: usize, config: &AnalysisConfig) -> Self {
        let annotated = reads.len();
        let retained = config.filter.retain(reads);
        let summaries = retained
            .iter()
            .map(|read| &read.summary)
            .collect::<Vec<_>>();

        let tally = ReadTally {
            annotated,
            skipped,
            failed_filter: annotated - retained.len(),
            no_consensus: summaries.iter().filter(|s| !s.is_called()).count(),
        };
        info!(
            "Sample {}: {} reads pass the quality filter, {} fail, {} skipped",
            name,
            retained.len(),
            tally.failed_filter,
            tally.skipped
        );

        Self {
            name: name.to_string(),
            tally,
            counts: ReadCounts::from_summaries(summaries.iter().copied()),
            histogram: GaHistogram::from_summaries(summaries.iter().copied()),
            pfm: CountMatrix::from_summaries(
                summaries.iter().copied(),
                config.center,
                config.selection,
            ),
        }
    }
}

/// Annotates a sample from its consensus table or, unless overwriting, reloads the mutation
/// table written by an earlier run
pub fn load_sample(
    name: &str,
    input_dir: &Path,
    mutinfo_dir: &Path,
    reference: &[u8],
    config: &AnalysisConfig,
) -> Result<SampleAnalysis> {
    config.filter.check_window(reference)?;
    let mutinfo = mutinfo_dir.join(format!("{}.csv", name));
    let reused = if !mutinfo.exists() {
        info!("Making mutation table for {}", name);
        None
    } else if config.overwrite {
        info!("Overwriting previous mutation table for {}", name);
        None
    } else {
        let reads = io::read_mutinfo(&mutinfo, reference, &config.filter)?;
        if reads.is_none() {
            info!(
                "Mutation table for {} is empty or was made with other settings, remaking it",
                name
            );
        }
        reads
    };

    let (reads, skipped) = match reused {
        Some(reads) => {
            info!("Mutation table already exists for {}", name);
            (reads, 0)
        }
        None => {
            let rows = io::consensus_rows(io::open_consensus(input_dir, name)?);
            let (reads, skipped) = annotate_reads(name, rows, reference, &config.filter)?;
            io::write_mutinfo(&mutinfo, name, &reads, &config.filter, reference)?;
            (reads, skipped)
        }
    };
    Ok(SampleAnalysis::new(name, reads, skipped, config))
}

/// Name shared by the technical replicates of a sample: a trailing `-<digits>` is removed
pub fn replicate_group(name: &str) -> &str {
    match name.rfind('-') {
        Some(i)
            if i > 0
                && i + 1 < name.len()
                && name[i + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &name[..i]
        }
        _ => name,
    }
}

/// Technical replicates of one biological sample, combined at the count stage
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGroup {
    /// Sample name without the replicate suffix
    pub name: String,
    /// Names of the combined samples
    pub replicates: Vec<String>,
    /// Summed read tallies
    pub tally: ReadTally,
    /// Summed substitution counts
    pub counts: ReadCounts,
    /// Summed `G -> A` histogram
    pub histogram: GaHistogram,
    /// Summed context counts
    pub pfm: CountMatrix,
}


/// Sums replicate counts, keeping groups in order of first appearance
pub fn combine_replicates(samples: &[SampleAnalysis]) -> Vec<SampleGroup> {
    let mut groups: Vec<SampleGroup> = Vec::new();
    for sample in samples {
        let name = replicate_group(&sample.name);
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => {
                group.replicates.push(sample.name.clone());
                group.tally = group.tally + sample.tally;
                group.counts = group.counts + sample.counts;
                group.histogram = group.histogram + sample.histogram;
                group.pfm += sample.pfm;
            }
            None => groups.push(SampleGroup {
                name: name.to_string(),
                replicates: vec![sample.name.clone()],
                tally: sample.tally,
                counts: sample.counts,
                histogram: sample.histogram,
                pfm: sample.pfm,
            }),
        }
    }
    groups
}

/// Group holding the background sample, matched by group or replicate name
pub fn background_group<'a>(groups: &'a [SampleGroup], background: &str) -> Result<&'a SampleGroup> {
    groups
        .iter()
        .find(|group| {
            group.name == background || group.replicates.iter().any(|name| name == background)
        })
        .ok_or_else(|| Error::MissingBackground(background.to_string()))
}

/// Logo matrices of every group corrected against the background group. A group whose
/// correction is numerically invalid fails the whole computation.
pub fn logos(groups: &[SampleGroup], config: &AnalysisConfig) -> Result<Vec<(String, LogoMatrices)>> {
    let background = background_group(groups, &config.background)?;
    info!(
        "Correcting against background {} with {} substitutions",
        background.name,
        background.pfm.n_substitutions()
    );

    groups
        .iter()
        .map(|group| {
            compute_heights(&group.pfm, &background.pfm, config.pseudocount)
                .map(|logo| (group.name.clone(), logo))
                .map_err(|e| {
                    error!("Could not compute logo for {}: {}", group.name, e);
                    e
                })
        })
        .collect()
}

/// Results of a run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Per-sample results in input order
    pub samples: Vec<SampleAnalysis>,
    /// Replicate groups in order of first appearance
    pub groups: Vec<SampleGroup>,
    /// Background-corrected logo matrices of each group
    pub logos: Vec<(String, LogoMatrices)>,
    /// Log-odds matrices of each group against the background
    pub pwms: Vec<(String, [[f64; 4]; 3])>,
    /// Trinucleotide census of the reference
    pub motifs: BTreeMap<String, usize>,
}

/// Runs every stage for the samples found in `input_dir`
pub fn run(
    samples: &[String],
    input_dir: &Path,
    output_dir: &Path,
    reference: &[u8],
    config: &AnalysisConfig,
) -> Result<Analysis> {
    config.filter.check_window(reference)?;
    let mutinfo_dir = output_dir.join(MUTINFO_DIR);
    std::fs::create_dir_all(&mutinfo_dir)?;

    let samples = samples
        .par_iter()
        .map(|name| load_sample(name, input_dir, &mutinfo_dir, reference, config))
        .collect::<Result<Vec<_>>>()?;

    let groups = combine_replicates(&samples);
    let logos = logos(&groups, config)?;
    let background = background_group(&groups, &config.background)?;
    let pwms = groups
        .iter()
        .map(|group| {
            (
                group.name.clone(),
                logo::position_weight_matrix(&group.pfm, &background.pfm, config.pseudocount),
            )
        })
        .collect();

    Ok(Analysis {
        samples,
        groups,
        logos,
        pwms,
        motifs: motif_counts(reference),
    })
}

impl Analysis {
    /// Writes the summary tables next to the mutation tables
    pub fn write(&self, output_dir: &Path) -> Result<()> {
        io::write_read_counts(
            output_dir.join("read_counts.tsv"),
            self.groups
                .iter()
                .map(|g| (g.name.as_str(), g.replicates.len(), &g.counts, &g.tally)),
        )?;
        io::write_histograms(
            output_dir.join("ga_histogram.tsv"),
            self.groups.iter().map(|g| (g.name.as_str(), &g.histogram)),
        )?;
        io::write_matrices(
            output_dir.join("heights.tsv"),
            self.logos.iter().map(|(name, l)| (name.as_str(), &l.heights)),
        )?;
        io::write_matrices(
            output_dir.join("corrected_ppm.tsv"),
            self.logos
                .iter()
                .map(|(name, l)| (name.as_str(), l.corrected.columns())),
        )?;
        io::write_matrices(
            output_dir.join("pwm.tsv"),
            self.pwms.iter().map(|(name, pwm)| (name.as_str(), pwm)),
        )?;
        io::write_motif_counts(output_dir.join("reference_motifs.tsv"), &self.motifs)?;
        info!("Wrote results to {}", output_dir.display());
        Ok(())
    }
}
