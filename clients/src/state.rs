//! Registry state persisted as a snapshot file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cmm_catalog::Catalog;
use cmm_registry::{ModelRegistry, RegistryConfig, RegistrySnapshot};

/// Loads the registry stored at `path`. A missing file is an empty
/// registry.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a snapshot, or
/// does not replay under `config`.
pub fn load(path: &Path, config: &RegistryConfig) -> Result<ModelRegistry> {
    let catalog = Arc::new(Catalog::standard());
    if !path.exists() {
        tracing::info!(path = %path.display(), "no state file, starting empty");
        return ModelRegistry::with_config(catalog, config.clone())
            .context("Invalid registry configuration");
    }
    let snapshot = read_snapshot(path)?;
    ModelRegistry::restore(&snapshot, catalog, config.clone())
        .with_context(|| format!("Failed to restore {}", path.display()))
}

/// Reads a snapshot file without replaying it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_snapshot(path: &Path) -> Result<RegistrySnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    RegistrySnapshot::from_json(&text)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

/// Writes the registry to `path`, replacing it only once the new
/// contents are fully written.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized or written.
/// A failed replace leaves the previous file and no temporary behind.
pub fn save(registry: &ModelRegistry, path: &Path) -> Result<()> {
    let json = registry
        .snapshot()
        .to_json()
        .context("Failed to serialize registry state")?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("Failed to replace {}", path.display()));
    }
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}
