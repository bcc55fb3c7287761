#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Quantification of APOBEC3-induced hypermutation in barcoded-subamplicon consensus reads.
//! Each consensus read is compared to the reference to count substitutions (overall and
//! `G -> A`), reads misaligned in the `R1`/`R2` overlap are dropped, and the 5'/3' context of
//! the remaining substitutions is summarised as background-corrected logo letter heights.
//!

/// Crate-wide error type
pub mod error;
pub mod filter;
pub mod io;
pub mod logo;
pub mod matrix;
/// Trinucleotide census of the reference
pub mod motif;
pub mod nucleotide;
pub mod pipeline;
pub mod stats;
/// Comparison of a consensus read with the reference
pub mod substitution;
/// Per-read substitutions and their sequence context
pub mod summary;

pub use crate::error::Error;
pub use crate::filter::{passes_filter, QualityFilter};
pub use crate::logo::{compute_heights, entropy, LogoMatrices, MAX_ENTROPY};
pub use crate::matrix::{CenterBase, ContextSelection, CountMatrix, ProbabilityMatrix};
pub use crate::substitution::{extract_substitutions, Substitution};
pub use crate::summary::{ReadSummary, SubstitutionContext};

/// Crate-wide result
pub type Result<T> = std::result::Result<T, crate::error::Error>;
