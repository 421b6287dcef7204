//! Record snapshot loading.
//!
//! The server runs against exported record data instead of a live instance:
//! three JSON files (`items.json`, `categories.json`, `events.json`) in one
//! directory, loaded into the core's in-memory gateway at startup. Transport
//! to a live record store is a separate collaborator and out of scope here.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use catalens_core::{CatalogCategory, CatalogItem, OrderEvent, StaticGateway};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file not found: `{0}`")]
    MissingFile(PathBuf),
    #[error("could not read snapshot file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse snapshot file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
}

/// Load a snapshot directory into a gateway. All three files must be present;
/// an empty JSON array is the way to say "no records of this type".
pub fn load_snapshot(dir: &Path) -> Result<StaticGateway, SnapshotError> {
    let items: Vec<CatalogItem> = load_file(&dir.join("items.json"))?;
    let categories: Vec<CatalogCategory> = load_file(&dir.join("categories.json"))?;
    let events: Vec<OrderEvent> = load_file(&dir.join("events.json"))?;

    info!(
        items = items.len(),
        categories = categories.len(),
        events = events.len(),
        "loaded record snapshot"
    );
    Ok(StaticGateway::new(items, categories, events))
}

fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::MissingFile(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)
        .map_err(|source| SnapshotError::ReadFile { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| SnapshotError::ParseFile { path: path.to_path_buf(), source })
}
