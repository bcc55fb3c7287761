#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Command line front end of the hypermutation analysis.
mod cli;

use hypermut::io::read_reference;
use hypermut::{pipeline, Error, Result};
use log::info;
use structopt::StructOpt;

fn main() -> Result<()> {
    let opt = cli::HyperMut::from_args();
    opt.set_logging();

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()
        .map_err(|_| Error::ThreadError)?;

    let reference = read_reference(&opt.reference, opt.reference_id.as_deref())?;
    let config = opt.config();
    info!(
        "Analysing {} samples with {} at the center and background {}",
        opt.samples.len(),
        config.center,
        config.background
    );

    let analysis = pipeline::run(
        &opt.samples,
        &opt.input_dir,
        &opt.output_dir,
        &reference,
        &config,
    )?;
    analysis.write(&opt.output_dir)
}
