pub mod init;
mod schema;

pub use schema::QuoteDefinition;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::form::Answers;

/// Get the config directory path (~/.config/quote-guide/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("quote-guide"))
}

/// Get the default quote definition path (~/.config/quote-guide/quote.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("quote.yaml"))
}

/// Load a quote definition from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to the definition. If None, uses the default path
///   (~/.config/quote-guide/quote.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The YAML cannot be parsed
///
/// The definition is not validated here; call [`QuoteDefinition::validate`].
pub fn load_definition(path: Option<PathBuf>) -> Result<QuoteDefinition> {
    let path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !path.exists() {
        anyhow::bail!(
            "Quote definition not found at {}. Run `quote-guide init` to create one",
            path.display()
        );
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read quote definition at {}", path.display()))?;

    let definition: QuoteDefinition = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse quote definition: invalid YAML in {}", path.display()))?;

    Ok(definition)
}

/// Load an answer set. Files ending in `.json` are read as JSON, anything
/// else as YAML.
pub fn load_answers(path: &Path) -> Result<Answers> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers at {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let answers = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse answers: invalid JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse answers: invalid YAML in {}", path.display()))?
    };

    Ok(answers)
}
