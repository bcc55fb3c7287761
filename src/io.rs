//! Delimited tables and FASTA references read and written at the edges of the analysis.

use crate::error::Error;
use crate::filter::QualityFilter;
use crate::stats::{GaHistogram, ReadCounts, ReadTally};
use crate::substitution::{parse_mutation_string, to_mutation_string};
use crate::summary::{AnnotatedRead, ReadSummary};
use crate::Result;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One barcode of the upstream consensus table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConsensusRow {
    /// Cell barcode grouping the reads of one template
    #[serde(rename = "Barcode", default)]
    pub barcode: String,
    /// Whether the consensus pipeline kept the barcode
    #[serde(rename = "Retained", deserialize_with = "flexible_bool")]
    pub retained: bool,
    /// Consensus sequence, `None` when no consensus was called
    #[serde(rename = "Consensus", default)]
    pub consensus: String,
}

/// Accepts `True`/`False` as written by pandas alongside the lowercase forms
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean but got `{}`",
            other
        ))),
    }
}

/// Retained rows of a comma delimited consensus table
pub fn consensus_rows<R: std::io::Read>(rdr: R) -> impl Iterator<Item = Result<ConsensusRow>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(rdr)
        .into_deserialize::<ConsensusRow>()
        .map(|row| row.map_err(Error::from))
        .filter(|row| row.as_ref().map_or(true, |row| row.retained))
}

/// Path of the consensus table of a sample, preferring the gzipped table
pub fn consensus_path(dir: &Path, sample: &str) -> PathBuf {
    let gz = dir.join(format!("{}_bcinfo.csv.gz", sample));
    if gz.exists() {
        gz
    } else {
        dir.join(format!("{}_bcinfo.csv", sample))
    }
}

/// Opens the consensus table of a sample, compressed or not
pub fn open_consensus(dir: &Path, sample: &str) -> Result<Box<dyn std::io::Read>> {
    let path = consensus_path(dir, sample);
    debug!("Opening consensus table {}", path.display());
    let (rdr, format) = niffler::from_path(&path)?;
    debug!("Consensus table {} has compression {:?}", path.display(), format);
    Ok(rdr)
}

/// Reads the reference record `id` or the first record when no id is given. The sequence is
/// uppercased.
pub fn read_reference<P: AsRef<Path>>(path: P, id: Option<&str>) -> Result<Vec<u8>> {
    let (rdr, _) = niffler::from_path(path.as_ref())?;
    let fasta_rdr = bio::io::fasta::Reader::new(rdr);
    for record in fasta_rdr.records() {
        let record = record?;
        if id.map_or(true, |id| record.id() == id) {
            info!(
                "Using reference {} of length {}",
                record.id(),
                record.seq().len()
            );
            return Ok(record.seq().to_ascii_uppercase());
        }
    }
    Err(Error::MissingReference(
        id.unwrap_or("<first record>").to_string(),
    ))
}

/// Row of a per-sample mutation information table. Every row records the filter window, mask
/// and reference length its window count was made with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutInfoRow {
    /// Barcode of the read
    pub barcode: String,
    /// Sample the read belongs to
    pub sample: String,
    /// Whether a consensus was called
    pub called: bool,
    /// Substitutions inside the quality window
    pub window_subs: usize,
    /// Space separated substitutions, `G12A`
    pub subs: String,
    /// Number of substitutions
    pub n_subs: usize,
    /// Number of `G -> A` substitutions
    pub n_ga_subs: usize,
    /// Space separated contexts, `T[G>A]G`
    pub sub_tups: String,
    /// Quality window start used for `window_subs`
    #[serde(default)]
    pub window_start: usize,
    /// Quality window end used for `window_subs`
    #[serde(default)]
    pub window_end: usize,
    /// Masked reference base used for `window_subs`, `none` when unmasked
    #[serde(default)]
    pub mask: String,
    /// Length of the reference the read was compared with
    #[serde(default)]
    pub reference_length: usize,
}

fn mask_label(mask: Option<u8>) -> String {
    mask.map_or_else(|| "none".to_string(), |nuc| (nuc as char).to_string())
}

impl MutInfoRow {
    fn new(sample: &str, read: &AnnotatedRead, filter: &QualityFilter, reference: &[u8]) -> Self {
        let summary = &read.summary;
        Self {
            barcode: read.barcode.clone(),
            sample: sample.to_string(),
            called: summary.is_called(),
            window_subs: read.window_subs,
            subs: to_mutation_string(summary.substitutions()),
            n_subs: summary.n_subs(),
            n_ga_subs: summary.n_ga_subs(),
            sub_tups: summary
                .contexts()
                .iter()
                .map(|ctx| ctx.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            window_start: filter.window.start,
            window_end: filter.window.end,
            mask: mask_label(filter.mask),
            reference_length: reference.len(),
        }
    }

    fn made_with(&self, filter: &QualityFilter, reference: &[u8]) -> bool {
        self.window_start == filter.window.start
            && self.window_end == filter.window.end
            && self.mask.eq_ignore_ascii_case(&mask_label(filter.mask))
            && self.reference_length == reference.len()
    }

    /// Rebuilds the read, `None` when a stored reference base disagrees with `reference`
    fn into_read(self, reference: &[u8]) -> Result<Option<AnnotatedRead>> {
        let summary = if self.called {
            let substitutions = parse_mutation_string(&self.subs)?;
            let same_reference = substitutions.iter().all(|sub| {
                sub.position
                    .checked_sub(1)
                    .and_then(|i| reference.get(i))
                    .map_or(false, |nuc| *nuc == sub.reference)
            });
            if !same_reference {
                return Ok(None);
            }
            ReadSummary::from_substitutions(substitutions, reference)?
        } else {
            ReadSummary::no_consensus()
        };
        Ok(Some(AnnotatedRead {
            barcode: self.barcode,
            window_subs: self.window_subs,
            summary,
        }))
    }
}

/// Writes the mutation information of every annotated read of a sample together with the
/// filter settings and reference length used to make it
pub fn write_mutinfo<P: AsRef<Path>>(
    path: P,
    sample: &str,
    reads: &[AnnotatedRead],
    filter: &QualityFilter,
    reference: &[u8],
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for read in reads {
        wtr.serialize(MutInfoRow::new(sample, read, filter, reference))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Loads a mutation information table, rebuilding contexts from the reference.
///
/// Returns `None` when the table is empty, was made with other filter settings or against a
/// different reference, in which case it has to be remade.
pub fn read_mutinfo<P: AsRef<Path>>(
    path: P,
    reference: &[u8],
    filter: &QualityFilter,
) -> Result<Option<Vec<AnnotatedRead>>> {
    let mut reads = Vec::new();
    for row in csv::Reader::from_path(path.as_ref())?.into_deserialize::<MutInfoRow>() {
        let row: MutInfoRow = row?;
        if !row.made_with(filter, reference) {
            debug!(
                "Mutation table {} was made with window {}..{}, mask {} and a reference of length {}",
                path.as_ref().display(),
                row.window_start,
                row.window_end,
                row.mask,
                row.reference_length
            );
            return Ok(None);
        }
        match row.into_read(reference)? {
            Some(read) => reads.push(read),
            None => return Ok(None),
        }
    }
    if reads.is_empty() {
        return Ok(None);
    }
    Ok(Some(reads))
}

fn tsv_writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path.as_ref())?)
}

#[derive(Debug, Serialize)]
struct ReadCountRow<'a> {
    sample: &'a str,
    replicates: usize,
    total_reads: u64,
    reads_with_subs: u64,
    reads_with_multiple_subs: u64,
    reads_with_ga_subs: u64,
    reads_with_multiple_ga_subs: u64,
    percent_reads_with_subs: f64,
    percent_reads_with_multiple_subs: f64,
    percent_reads_with_ga_subs: f64,
    percent_reads_with_multiple_ga_subs: f64,
    skipped_reads: usize,
    failed_filter_reads: usize,
    no_consensus_reads: usize,
}

/// Writes read counts of each sample as `(name, replicates, counts, tally)`
pub fn write_read_counts<'a, P, I>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a str, usize, &'a ReadCounts, &'a ReadTally)>,
{
    let mut wtr = tsv_writer(path)?;
    for (sample, replicates, counts, tally) in rows {
        wtr.serialize(ReadCountRow {
            sample,
            replicates,
            total_reads: counts.total_reads,
            reads_with_subs: counts.reads_with_subs,
            reads_with_multiple_subs: counts.reads_with_multiple_subs,
            reads_with_ga_subs: counts.reads_with_ga_subs,
            reads_with_multiple_ga_subs: counts.reads_with_multiple_ga_subs,
            percent_reads_with_subs: counts.percent(counts.reads_with_subs),
            percent_reads_with_multiple_subs: counts.percent(counts.reads_with_multiple_subs),
            percent_reads_with_ga_subs: counts.percent(counts.reads_with_ga_subs),
            percent_reads_with_multiple_ga_subs: counts
                .percent(counts.reads_with_multiple_ga_subs),
            skipped_reads: tally.skipped,
            failed_filter_reads: tally.failed_filter,
            no_consensus_reads: tally.no_consensus,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct HistogramRow<'a> {
    sample: &'a str,
    n_ga_subs: String,
    reads: u64,
    percent: f64,
}

/// Writes the G-to-A histogram of each sample in long format
pub fn write_histograms<'a, P, I>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a str, &'a GaHistogram)>,
{
    let mut wtr = tsv_writer(path)?;
    for (sample, histogram) in rows {
        for (n_ga_subs, reads, percent) in histogram.rows() {
            wtr.serialize(HistogramRow {
                sample,
                n_ga_subs,
                reads,
                percent,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct MatrixRow<'a> {
    sample: &'a str,
    site: i8,
    nt: char,
    value: f64,
}

/// Writes `[site][nucleotide]` matrices of each sample in long format, as consumed by logo
/// plotting
pub fn write_matrices<'a, P, I>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a str, &'a [[f64; 4]; 3])>,
{
    let mut wtr = tsv_writer(path)?;
    for (sample, matrix) in rows {
        for (site, nuc, value) in crate::matrix::cells(matrix) {
            wtr.serialize(MatrixRow {
                sample,
                site,
                nt: nuc as char,
                value,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the trinucleotide census of the reference
pub fn write_motif_counts<P: AsRef<Path>>(path: P, counts: &BTreeMap<String, usize>) -> Result<()> {
    let mut wtr = tsv_writer(path)?;
    wtr.write_record(&["motif", "count"])?;
    for (motif, count) in counts {
        wtr.write_record(&[motif.as_str(), count.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
