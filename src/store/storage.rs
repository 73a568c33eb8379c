use super::types::{Store, STORE_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load the record store from a JSON file
///
/// If the file doesn't exist, returns a new empty store.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> Result<Store> {
    if !path.exists() {
        return Ok(Store::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open record store at {}", path.display()))?;

    let store: Store = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load record store at {}", path.display()))?;

    if store.version != STORE_VERSION {
        anyhow::bail!("Unsupported record store version: {}", store.version);
    }

    Ok(store)
}

/// Save the record store to a JSON file atomically
///
/// The file is never left half-written. Creates the parent directory if needed.
pub fn save_store(path: &Path, store: &Store) -> Result<()> {
    crate::config::ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, store).context("Failed to serialize record store")?;

    file.commit().context("Failed to save record store")?;

    Ok(())
}
