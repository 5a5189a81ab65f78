use super::types::EstimateCache;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default estimate cache path (~/.config/quote-guide/estimates.json)
pub fn get_cache_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("estimates.json"))
}

/// Load the estimate cache from a JSON file
///
/// If the file doesn't exist, returns a new empty cache.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_cache(path: &Path) -> Result<EstimateCache> {
    if !path.exists() {
        return Ok(EstimateCache::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open estimate cache at {}", path.display()))?;

    let cache: EstimateCache =
        serde_json::from_reader(file).context("Failed to load estimate cache")?;

    if cache.version != 1 {
        anyhow::bail!("Unsupported estimate cache version: {}", cache.version);
    }

    Ok(cache)
}

/// Save the estimate cache to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_cache(path: &Path, cache: &EstimateCache) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory at {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, cache).context("Failed to serialize estimate cache")?;

    file.commit().context("Failed to save estimate cache")?;

    Ok(())
}
