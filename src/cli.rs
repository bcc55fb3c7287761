use hypermut::filter::QualityFilter;
use hypermut::matrix::{CenterBase, ContextSelection};
use hypermut::pipeline::AnalysisConfig;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

/// Base masked from the quality window, `none` to count every substitution
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mask(Option<u8>);

impl FromStr for Mask {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Mask(None)),
            "A" | "C" | "G" | "T" => Ok(Mask(Some(s.as_bytes()[0].to_ascii_uppercase()))),
            _ => Err(format!("`{}` is not a nucleotide or `none`", s)),
        }
    }
}

impl std::fmt::Display for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(nuc) => write!(f, "{}", nuc as char),
            None => write!(f, "none"),
        }
    }
}

fn parse_pseudocount(s: &str) -> std::result::Result<f64, String> {
    let pseudocount = s.parse::<f64>().map_err(|e| e.to_string())?;
    if pseudocount.is_finite() && pseudocount >= 0.0 {
        Ok(pseudocount)
    } else {
        Err(format!("pseudocount must be a non-negative number but got {}", s))
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "hypermut",
    about = "Quantifies APOBEC3 G-to-A hypermutation in consensus reads"
)]
pub(crate) struct HyperMut {
    #[structopt(short, long, help = "Reference FASTA (optionally gzipped)", parse(from_os_str))]
    pub reference: PathBuf,
    #[structopt(long, help = "Reference record to use instead of the first one")]
    pub reference_id: Option<String>,
    #[structopt(
        short,
        long,
        help = "Directory with the <sample>_bcinfo.csv[.gz] consensus tables",
        default_value = ".",
        parse(from_os_str)
    )]
    pub input_dir: PathBuf,
    #[structopt(
        short,
        long,
        help = "Directory receiving mutation tables and summaries",
        default_value = "results",
        parse(from_os_str)
    )]
    pub output_dir: PathBuf,
    #[structopt(
        short,
        long,
        help = "Base placed at the center of the context matrix [reference, observed]"
    )]
    pub center: CenterBase,
    #[structopt(
        long,
        help = "Substitutions counted in the context matrix [all, ga]",
        default_value = "all"
    )]
    pub selection: ContextSelection,
    #[structopt(
        short,
        long,
        help = "Sample (or replicate group) used as background",
        default_value = "NoA3"
    )]
    pub background: String,
    #[structopt(
        long,
        help = "Pseudocount added to each background cell",
        default_value = "1.0",
        parse(try_from_str = parse_pseudocount)
    )]
    pub pseudocount: f64,
    #[structopt(long, help = "First 0-based position of the quality window", default_value = "130")]
    pub window_start: usize,
    #[structopt(long, help = "End (exclusive) of the quality window", default_value = "170")]
    pub window_end: usize,
    #[structopt(
        long,
        help = "Reference base ignored in the quality window, `none` to count all",
        default_value = "G"
    )]
    pub mask: Mask,
    #[structopt(long, help = "Maximum substitutions in the quality window", default_value = "3")]
    pub max_subs: usize,
    #[structopt(long, help = "Recompute mutation tables that already exist")]
    pub overwrite: bool,
    #[structopt(short, long, help = "Number of threads", default_value = "1")]
    pub threads: usize,
    #[structopt(
        short,
        long,
        parse(from_occurrences),
        help = "Verbosity (-v info, -vv debug, -vvv trace), RUST_LOG takes precedence"
    )]
    pub verbose: u8,
    #[structopt(help = "Samples to analyse", required = true)]
    pub samples: Vec<String>,
}

impl HyperMut {
    pub fn set_logging(&self) {
        let mut builder = if std::env::var_os("RUST_LOG").is_some() {
            env_logger::Builder::from_default_env()
        } else {
            let level = match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            };
            let mut builder = env_logger::Builder::new();
            builder.filter_level(level);
            builder
        };
        builder.init();
    }

    pub fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::new(self.center);
        config.filter = QualityFilter::new(
            self.window_start..self.window_end,
            self.mask.0,
            self.max_subs,
        );
        config.selection = self.selection;
        config.pseudocount = self.pseudocount;
        config.background = self.background.clone();
        config.overwrite = self.overwrite;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypermut::filter::{DEFAULT_MASK, DEFAULT_MAX_SUBS, DEFAULT_WINDOW_END, DEFAULT_WINDOW_START};
    use hypermut::pipeline::DEFAULT_BACKGROUND;

    #[test]
    fn test_defaults_match_filter() {
        let opt = HyperMut::from_iter(&["hypermut", "-r", "ref.fa", "-c", "reference", "A3G-1"]);
        let config = opt.config();
        assert_eq!(config.filter.window, DEFAULT_WINDOW_START..DEFAULT_WINDOW_END);
        assert_eq!(config.filter.mask, Some(DEFAULT_MASK));
        assert_eq!(config.filter.max_subs, DEFAULT_MAX_SUBS);
        assert_eq!(config.background, DEFAULT_BACKGROUND);
        assert_eq!(config.center, CenterBase::Reference);
        assert_eq!(config.selection, ContextSelection::All);
    }

    #[test]
    fn test_center_is_required() {
        assert!(HyperMut::from_iter_safe(&["hypermut", "-r", "ref.fa", "A3G-1"]).is_err());
    }

    #[test]
    fn test_negative_pseudocount_rejected() {
        let args = |pseudocount: &str| {
            let pseudocount = format!("--pseudocount={}", pseudocount);
            HyperMut::from_iter_safe(vec![
                "hypermut",
                "-r",
                "ref.fa",
                "-c",
                "observed",
                pseudocount.as_str(),
                "A3G-1",
            ])
        };
        assert!(args("-1").is_err());
        assert!(args("NaN").is_err());
        assert_eq!(args("0.5").unwrap().config().pseudocount, 0.5);
        assert_eq!(args("0").unwrap().config().pseudocount, 0.0);
    }

    #[test]
    fn test_mask() {
        assert_eq!("none".parse::<Mask>().unwrap().0, None);
        assert_eq!("g".parse::<Mask>().unwrap().0, Some(b'G'));
        assert!("X".parse::<Mask>().is_err());
    }
}
