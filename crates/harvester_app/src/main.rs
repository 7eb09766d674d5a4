//! `feed_harvester`: replays saved feed snapshots through a harvesting
//! session and writes the captured items as numbered JSON batches.
//!
//! ```text
//! feed_harvester --frames ./snapshots --requests ./snapshots/requests.log \
//!     --output ./harvest --stop-at 1790000000000000000 --resume
//! ```
mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;
use engine_logging::engine_error;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    platform::logging::initialize(args.log, args.verbose);

    match platform::app::run(args) {
        Ok(report) if report.unflushed.is_empty() => ExitCode::SUCCESS,
        Ok(report) => {
            engine_error!(
                "{} records were captured but never written",
                report.unflushed.len()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("feed_harvester: {err:#}");
            ExitCode::FAILURE
        }
    }
}
