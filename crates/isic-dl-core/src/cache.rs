//! Metadata cache file: the on-disk JSON snapshot of all detail records.
//!
//! When the file exists it is the sole source of truth and no metadata is
//! fetched from the network.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::api::IsicSource;
use crate::catalog::fetch_catalog;
use crate::config::IsicConfig;
use crate::details::fetch_details;
use crate::model::DetailRecord;
use crate::storage;

/// Read and parse the cache file.
pub fn load(path: &Path) -> Result<Vec<DetailRecord>> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let records: Vec<DetailRecord> =
        serde_json::from_slice(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(records)
}

/// Serialize `records` as a pretty-printed (4-space) JSON array.
pub fn to_pretty_json(records: &[DetailRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser).context("serialize metadata")?;
    Ok(buf)
}

/// Write the whole cache file, replacing any previous one.
pub fn save(path: &Path, records: &[DetailRecord]) -> Result<()> {
    let data = to_pretty_json(records)?;
    storage::write_replace(path, &data)?;
    tracing::info!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Return all detail records, from the cache file when present, else from the API.
///
/// A fresh fetch runs catalog pagination, then the partitioned detail phase,
/// and persists the aggregate only when it is non-empty.
pub fn load_or_fetch<S: IsicSource + ?Sized>(source: &S, config: &IsicConfig) -> Result<Vec<DetailRecord>> {
    fs::create_dir_all(&config.workspace_path)
        .with_context(|| format!("create workspace {}", config.workspace_path.display()))?;

    let path = config.meta_path();
    if path.exists() {
        tracing::info!("using cached metadata at {}", path.display());
        return load(&path);
    }

    let entries = fetch_catalog(source, config.page_size)?;
    let records = fetch_details(source, &entries, config.num_threads)?;
    if records.is_empty() {
        tracing::warn!("no records fetched; not writing {}", path.display());
    } else {
        save(&path, &records)?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeSource;
    use serde_json::json;

    fn config_in(dir: &Path) -> IsicConfig {
        IsicConfig {
            workspace_path: dir.join("ws"),
            num_threads: 3,
            page_size: 2,
            ..IsicConfig::default()
        }
    }

    fn two_image_source() -> FakeSource {
        FakeSource::new()
            .with_json(
                "image?limit=2&offset=0&sort=name",
                json!([ { "_id": "a" }, { "_id": "b" } ]),
            )
            .with_json("image?limit=2&offset=2&sort=name", json!([]))
            .with_json("image/a", json!({ "_id": "a", "name": "ISIC_A" }))
            .with_json("image/b", json!({ "_id": "b", "name": "ISIC_B" }))
            .with_json("segmentation?imageId=a", json!([ { "_id": "sa" } ]))
            .with_json("segmentation?imageId=b", json!([]))
    }

    #[test]
    fn missing_cache_triggers_fetch_and_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let source = two_image_source();

        let records = load_or_fetch(&source, &cfg).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "b");
        assert!(!source.calls().is_empty());
        assert_eq!(load(&cfg.meta_path()).unwrap(), records);
    }

    #[test]
    fn existing_cache_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let first = load_or_fetch(&two_image_source(), &cfg).unwrap();

        let untouched = FakeSource::new();
        let second = load_or_fetch(&untouched, &cfg).unwrap();

        assert!(untouched.calls().is_empty());
        assert_eq!(second, first);
    }

    #[test]
    fn empty_result_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let source = FakeSource::new().with_json("image?limit=2&offset=0&sort=name", json!([]));

        let records = load_or_fetch(&source, &cfg).unwrap();

        assert!(records.is_empty());
        assert!(cfg.workspace_path.is_dir());
        assert!(!cfg.meta_path().exists());
    }

    #[test]
    fn save_writes_four_space_indent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images_meta.json");
        let records: Vec<DetailRecord> = serde_json::from_value(json!([
            { "_id": "a", "meta": { "clinical": { "diagnosis": "nevus" } }, "segmentation": [] }
        ]))
        .unwrap();

        save(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"_id\": \"a\""), "{}", text);
        assert_eq!(load(&path).unwrap(), records);
        // Saving the loaded value again produces identical bytes.
        assert_eq!(to_pretty_json(&load(&path).unwrap()).unwrap(), text.as_bytes());
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images_meta.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse"));
    }
}
