use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

use crate::config::{ensure_parent_dir, Config};
use crate::scoring::{DetectionConfig, ScoringConfig};

const HEADER: &str = "\
# site-risk configuration
#
# severity_weights: points for a fresh, fully-confident signal of each severity
# recency: age bands in whole days; first matching band wins
# trend_threshold: score change beyond which a site is improving/deteriorating
# detection.late_work_order: days-late bands; first matching band wins
";

/// Write a config file populated with the built-in defaults.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = Config {
        store: None,
        scoring: Some(ScoringConfig::default()),
        detection: Some(DetectionConfig::default()),
    };
    let yaml = serde_saphyr::to_string(&config).context("Failed to serialize default config")?;

    ensure_parent_dir(path)?;
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(HEADER.as_bytes())
        .and_then(|_| file.write_all(yaml.as_bytes()))
        .context("Failed to write config file")?;
    file.commit().context("Failed to save config file")?;

    Ok(())
}
