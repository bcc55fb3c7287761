use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised while comparing reads, building matrices or reading/writing tables
pub enum Error {
    #[error("Mutant of length {mutant} cannot be compared to reference of length {reference}")]
    /// Sequence pair lengths differ
    LengthMismatch {
        /// Length of the mutant (consensus) sequence
        mutant: usize,
        /// Length of the reference sequence
        reference: usize,
    },
    #[error("Only A, C, G, T and N nucleotides are allowed but got `{symbol}` at site {position}")]
    /// Incorrect nucleotide supplied
    InvalidSymbol {
        /// Offending symbol
        symbol: char,
        /// 1-based site of the symbol
        position: usize,
    },
    #[error("Probability {value} at site {site} nucleotide {nuc} is not a valid probability")]
    /// Malformed probability entering the entropy calculation
    Domain {
        /// Offending value
        value: f64,
        /// Relative site of the column (-1, 0 or 1)
        site: i8,
        /// Nucleotide of the row
        nuc: char,
    },
    #[error("Quality window {start}..{end} does not fit a reference of length {reference}")]
    /// Filter window is empty, reversed or extends past the reference
    InvalidWindow {
        /// 0-based window start
        start: usize,
        /// Exclusive window end
        end: usize,
        /// Length of the reference
        reference: usize,
    },
    #[error("Could not parse substitution `{0}`")]
    /// Stored substitution string is malformed
    BadSubstitution(String),
    #[error("Could not read/write file")]
    /// I/O error
    Io(#[from] std::io::Error),
    #[error("Could not read/write delimited table")]
    /// CSV error
    Csv(#[from] csv::Error),
    #[error("Could not open possibly compressed file")]
    /// Compressed reader creation error
    Compression(#[from] niffler::Error),
    #[error("Could not convert bytes as they are invalid UTF-8")]
    /// Data is not in UTF-8 format
    NotUTF8(#[from] std::string::FromUtf8Error),
    #[error("No FASTA record `{0}` in reference file")]
    /// Requested reference record is absent
    MissingReference(String),
    #[error("Background sample `{0}` is not among the analysed samples")]
    /// Negative control sample is absent
    MissingBackground(String),
    #[error("Could not spawn threads")]
    /// Create thread pools error
    ThreadError,
}
