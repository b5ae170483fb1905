//! The catalog manifest stands in for the library database: a JSON list of
//! games whose cover paths may be relative to the manifest itself.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use shelf_core::{CatalogEntry, cover_sequence};
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct CatalogManifest {
    #[serde(default)]
    games: Vec<CatalogEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogIssue {
    #[error("game id {0} appears more than once")]
    DuplicateId(i64),
    #[error("game {id} ({title}) has no cover reference")]
    MissingCover { id: i64, title: String },
}

/// Catalog entries with cover references resolved to filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub source: PathBuf,
    pub entries: Vec<CatalogEntry>,
}

impl LoadedCatalog {
    pub fn sequence(&self) -> Vec<String> {
        cover_sequence(&self.entries)
    }

    pub fn entry(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn load_catalog(path: &Path) -> Result<LoadedCatalog> {
    let data =
        fs::read(path).with_context(|| format!("reading catalog manifest {}", path.display()))?;
    let manifest: CatalogManifest = serde_json::from_slice(&data)
        .with_context(|| format!("parsing catalog manifest {}", path.display()))?;
    validate_entries(&manifest.games)
        .with_context(|| format!("validating catalog manifest {}", path.display()))?;

    let entries = manifest
        .games
        .into_iter()
        .map(|mut entry| {
            let resolved = resolve_cover_path(path, Path::new(&entry.cover_image_ref));
            entry.cover_image_ref = resolved.to_string_lossy().into_owned();
            entry
        })
        .collect();

    Ok(LoadedCatalog {
        source: path.to_path_buf(),
        entries,
    })
}

fn validate_entries(entries: &[CatalogEntry]) -> std::result::Result<(), CatalogIssue> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.id) {
            return Err(CatalogIssue::DuplicateId(entry.id));
        }
        if entry.cover_image_ref.trim().is_empty() {
            return Err(CatalogIssue::MissingCover {
                id: entry.id,
                title: entry.title.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_cover_path(manifest_path: &Path, cover: &Path) -> PathBuf {
    if cover.is_absolute() {
        return cover.to_path_buf();
    }

    let from_manifest = manifest_path
        .parent()
        .map(|parent| parent.join(cover))
        .unwrap_or_else(|| cover.to_path_buf());
    if from_manifest.exists() {
        return from_manifest;
    }

    if cover.exists() {
        return cover.to_path_buf();
    }

    from_manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelf_core::ADD_NEW_SENTINEL;
    use tempfile::tempdir;

    fn write_manifest(dir: &Path, value: serde_json::Value) -> PathBuf {
        let path = dir.join("catalog.json");
        fs::write(
            &path,
            serde_json::to_vec_pretty(&value).expect("encode manifest"),
        )
        .expect("write manifest");
        path
    }

    #[test]
    fn relative_covers_resolve_against_manifest() {
        let temp = tempdir().expect("temp dir");
        fs::create_dir(temp.path().join("covers")).expect("covers dir");
        fs::write(temp.path().join("covers/loom.png"), b"png").expect("cover");
        let manifest = write_manifest(
            temp.path(),
            json!({
                "games": [
                    { "id": 1, "title": "Loom", "cover": "covers/loom.png" },
                    { "id": 2, "title": "Zak", "cover": "/abs/zak.png" }
                ]
            }),
        );

        let catalog = load_catalog(&manifest).expect("load catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            PathBuf::from(&catalog.entries[0].cover_image_ref),
            temp.path().join("covers/loom.png")
        );
        assert_eq!(catalog.entries[1].cover_image_ref, "/abs/zak.png");

        let sequence = catalog.sequence();
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence[2], ADD_NEW_SENTINEL);
    }

    #[test]
    fn empty_manifest_yields_only_placeholder() {
        let temp = tempdir().expect("temp dir");
        let manifest = write_manifest(temp.path(), json!({}));
        let catalog = load_catalog(&manifest).expect("load catalog");
        assert!(catalog.is_empty());
        assert_eq!(catalog.sequence(), [ADD_NEW_SENTINEL]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let temp = tempdir().expect("temp dir");
        let manifest = write_manifest(
            temp.path(),
            json!({
                "games": [
                    { "id": 7, "title": "A", "cover": "a.png" },
                    { "id": 7, "title": "B", "cover": "b.png" }
                ]
            }),
        );
        let err = load_catalog(&manifest).expect_err("duplicate id");
        assert_eq!(
            err.root_cause().downcast_ref::<CatalogIssue>(),
            Some(&CatalogIssue::DuplicateId(7))
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("nope.json");
        let err = load_catalog(&path).expect_err("missing manifest");
        assert!(format!("{err}").contains("nope.json"));
    }
}
