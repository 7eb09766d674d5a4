use std::path::PathBuf;

use clap::Parser;
use harvester_core::HarvestConfig;

use crate::platform::logging::LogDestination;

/// Harvest feed items from saved page snapshots into JSON batches.
#[derive(Parser, Debug)]
#[command(name = "feed_harvester")]
#[command(about = "Replay rendered feed snapshots and export every item once, in batches")]
pub struct Args {
    /// Directory of rendered HTML snapshots, replayed in file-name order
    #[arg(short, long)]
    pub frames: PathBuf,

    /// Request log with one `<frame> <url>` line per intercepted request
    #[arg(short, long)]
    pub requests: Option<PathBuf>,

    /// Output directory for batch files
    #[arg(short, long, default_value = "./harvest")]
    pub output: PathBuf,

    /// RON session config; command-line options override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop when this item id comes into view (it is not captured)
    #[arg(long)]
    pub stop_at: Option<String>,

    /// Item id to leave out (repeatable)
    #[arg(long = "skip-id")]
    pub skip_ids: Vec<String>,

    /// Skip every id already present in earlier batches in the output directory
    #[arg(long, default_value = "false")]
    pub resume: bool,

    /// Records per batch file
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Milliseconds between scroll ticks
    #[arg(long)]
    pub scroll_interval_ms: Option<u64>,

    /// Pixels scrolled per tick
    #[arg(long)]
    pub scroll_step: Option<u64>,

    /// Base URL for resolving relative permalinks
    #[arg(long)]
    pub origin: Option<String>,

    /// Scroll distance that reveals the next snapshot
    #[arg(long, default_value = "1200")]
    pub frame_span: u64,

    /// Extra ticks after the last snapshot before the session stops
    #[arg(long, default_value = "3")]
    pub linger: u32,

    /// Batch file name prefix; a run timestamp is appended
    #[arg(long, default_value = "feed")]
    pub prefix: String,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Both)]
    pub log: LogDestination,

    /// Include debug output in the log
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Print the effective config as RON and exit
    #[arg(long, default_value = "false")]
    pub dump_config: bool,
}

impl Args {
    /// Command-line values win over whatever the config file said.
    pub fn apply_overrides(&self, config: &mut HarvestConfig) {
        if let Some(stop_at) = &self.stop_at {
            config.stop_at_id = Some(stop_at.clone());
        }
        config.skip_ids.extend(self.skip_ids.iter().cloned());
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(interval) = self.scroll_interval_ms {
            config.scroll_interval_ms = interval;
        }
        if let Some(step) = self.scroll_step {
            config.scroll_step = step;
        }
        if let Some(origin) = &self.origin {
            config.origin = origin.clone();
        }
    }

    /// Prefix shared by the batch files of every run, used for resume.
    pub fn resume_prefix(&self) -> String {
        format!("{}_", self.prefix)
    }
}
