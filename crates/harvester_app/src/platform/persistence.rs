use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use engine_logging::{engine_info, engine_warn};
use harvester_core::HarvestConfig;
use harvester_engine::load_known_ids;

/// Reads a RON session config. Keys left out keep their defaults, and no
/// path at all means an all-default config.
pub(crate) fn load_config(path: Option<&Path>) -> Result<HarvestConfig> {
    let Some(path) = path else {
        return Ok(HarvestConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: HarvestConfig =
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    engine_info!("Loaded config from {:?}", path);
    Ok(config)
}

/// The effective config as pretty RON, in the same shape `load_config` reads.
pub(crate) fn render_config(config: &HarvestConfig) -> Result<String> {
    let pretty = ron::ser::PrettyConfig::new();
    ron::ser::to_string_pretty(config, pretty).context("serializing config")
}

/// Ids already exported by earlier runs that used the same file prefix.
pub(crate) fn resume_ids(output_dir: &Path, prefix: &str) -> Result<BTreeSet<String>> {
    let ids = load_known_ids(output_dir, prefix)
        .with_context(|| format!("resuming from {}", output_dir.display()))?;
    if ids.is_empty() {
        engine_warn!(
            "Resume requested but no {}* batches found in {:?}",
            prefix,
            output_dir
        );
    } else {
        engine_info!("Resuming: {} ids already exported", ids.len());
    }
    Ok(ids)
}
