//! Pattern table files
//!
//! A table is an ordered list of records. TOML files use `[[pattern]]`
//! tables; JSON files hold `{"pattern": [...]}`. The format follows the file
//! extension (`.json` is JSON, anything else TOML).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{PatternRecord, PatternStore};
use crate::config::loader::ConfigFormat;
use crate::error::{Error, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PatternFile {
    #[serde(default)]
    pattern: Vec<PatternRecord>,
}

/// Read the records of a table file, in order
pub fn read_records(path: &Path) -> Result<Vec<PatternRecord>> {
    let load_failed = |reason: String| Error::PatternFileLoadFailed {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
    let file: PatternFile = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?,
        ConfigFormat::Toml => toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?,
    };

    debug!("Read {} patterns from {}", file.pattern.len(), path.display());
    Ok(file.pattern)
}

/// Load a table file into a new store
pub fn load(path: &Path) -> Result<PatternStore> {
    let store = PatternStore::from_records(read_records(path)?);
    info!("Loaded {} patterns from {}", store.len(), path.display());
    Ok(store)
}

/// Load `path` if given and present, otherwise the built-in table
pub fn load_or_builtin(path: Option<&Path>) -> Result<PatternStore> {
    match path {
        Some(path) if path.exists() => load(path),
        Some(path) => {
            info!(
                "Pattern file {} not found, using built-in patterns",
                path.display()
            );
            Ok(PatternStore::with_builtin())
        }
        None => Ok(PatternStore::with_builtin()),
    }
}

/// Write the store's records to `path`, creating parent directories
pub fn save(store: &PatternStore, path: &Path) -> Result<()> {
    save_records(&store.records(), path)
}

/// Write records to `path`, creating parent directories
pub fn save_records(records: &[PatternRecord], path: &Path) -> Result<()> {
    let save_failed = |reason: String| Error::PatternFileSaveFailed {
        path: path.to_path_buf(),
        reason,
    };

    let file = PatternFile {
        pattern: records.to_vec(),
    };
    let content = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(&file).map_err(|e| save_failed(e.to_string()))?
        }
        ConfigFormat::Toml => toml::to_string_pretty(&file).map_err(|e| save_failed(e.to_string()))?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
    }
    fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;

    info!("Saved {} patterns to {}", records.len(), path.display());
    Ok(())
}

/// Render records as a TOML table
pub fn to_toml_string(records: &[PatternRecord]) -> Result<String> {
    let file = PatternFile {
        pattern: records.to_vec(),
    };
    toml::to_string_pretty(&file).map_err(|e| Error::Other(e.to_string()))
}
