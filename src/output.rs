//! Persistence collaborator: writes the aggregated owner list to disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name the owner list is written under, in the chosen directory.
pub const OWNERS_FILE_NAME: &str = "nft-collection-owners.json";

/// Writes the owners as a 2-space-indented UTF-8 JSON array and returns the
/// full path of the written file. Write failures surface to the caller and
/// are not retried.
pub fn write_owners_file(owners: &[String], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(OWNERS_FILE_NAME);
    let body = serde_json::to_string_pretty(owners).context("failed to serialize owners list")?;
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
