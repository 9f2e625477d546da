mod args;
mod profiling;

use clap::Parser;
use log::{error, LevelFilter};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = profiling::run(&args) {
        error!("{}", e);
        for cause in ErrorCompat::iter_chain(&*e).skip(1) {
            error!("  caused by: {}", cause);
        }
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
