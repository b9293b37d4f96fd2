use std::process;

use clap::Parser;
use vehicle_data_etl::cli::{self, Args};
use vehicle_data_etl::logging;

fn main() {
    let args = Args::parse();
    logging::init_tracing(&args.log_level);
    process::exit(cli::run(&args));
}
