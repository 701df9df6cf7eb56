//! Maintenance passes over an existing metadata cache.
//!
//! Each pass is a plain function over the loaded records; callers decide
//! whether to persist the result with [`rewrite_cache`].

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache;
use crate::model::DetailRecord;

/// Segmentation ids known to have no downloadable mask upstream.
pub const DEFAULT_MISSING_MASKS: [&str; 2] = ["584727129fc3c10f04859aad", "58470b479fc3c10f04859672"];

/// Clinical keys that mark a record as labeled.
const LABEL_KEYS: [&str; 2] = ["diagnosis", "benign_malignant"];

const BENIGN_MALIGNANT: &str = "benign_malignant";

/// A record lacks a clinical field required by a statistics pass.
#[derive(Debug, Error)]
#[error("record {id} has no meta.clinical.{key}")]
pub struct MissingLabel {
    pub id: String,
    pub key: &'static str,
}

/// Benign vs malignant counts under `meta.clinical.benign_malignant`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub benign: usize,
    pub malignant: usize,
    /// Records whose label is present but is neither value.
    pub other: usize,
}

/// Remove the named segmentation sub-records from every record. Returns how many were removed.
pub fn drop_segmentations(records: &mut [DetailRecord], ids: &[&str]) -> usize {
    let ids: HashSet<&str> = ids.iter().copied().collect();
    let mut removed = 0;
    for DetailRecord {
        id: image_id,
        segmentation,
        ..
    } in records.iter_mut()
    {
        let before = segmentation.len();
        segmentation.retain(|s| {
            let keep = !ids.contains(s.id.as_str());
            if !keep {
                tracing::warn!("segmentation {} of image {} removed", s.id, image_id);
            }
            keep
        });
        removed += before - segmentation.len();
    }
    removed
}

/// Keep only the records that have at least one segmentation.
pub fn drop_unsegmented(records: Vec<DetailRecord>) -> Vec<DetailRecord> {
    records
        .into_iter()
        .filter(|r| {
            if r.segmentation.is_empty() {
                tracing::warn!("image {} removed (no segmentation)", r.id);
                false
            } else {
                true
            }
        })
        .collect()
}

/// File names (`{id}.jpg`) of the images referenced by `records`.
pub fn image_file_names(records: &[DetailRecord]) -> HashSet<String> {
    records.iter().map(DetailRecord::image_file_name).collect()
}

/// File names (`{id}.jpg`) of every segmentation mask referenced by `records`.
pub fn mask_file_names(records: &[DetailRecord]) -> HashSet<String> {
    records
        .iter()
        .flat_map(|r| r.segmentation.iter().map(|s| s.mask_file_name()))
        .collect()
}

/// Delete regular files in `dir` whose name is not in `keep`. Returns the deleted paths.
pub fn prune_orphans(dir: &Path, keep: &HashSet<String>) -> Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let orphan = match name.to_str() {
            Some(name) => !keep.contains(name),
            None => true,
        };
        if orphan {
            let path = entry.path();
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
            tracing::warn!("{} deleted", path.display());
            deleted.push(path);
        }
    }
    deleted.sort();
    Ok(deleted)
}

/// Number of records whose clinical metadata carries a diagnosis or a benign/malignant label.
pub fn count_labeled(records: &[DetailRecord]) -> usize {
    records
        .iter()
        .filter(|r| {
            r.clinical()
                .map(|c| LABEL_KEYS.iter().any(|k| c.contains_key(*k)))
                .unwrap_or(false)
        })
        .count()
}

/// Count benign and malignant records. Every record must carry the label.
pub fn benign_malignant(records: &[DetailRecord]) -> Result<LabelCounts, MissingLabel> {
    let mut counts = LabelCounts::default();
    for record in records {
        let label = record
            .clinical()
            .and_then(|c| c.get(BENIGN_MALIGNANT))
            .ok_or_else(|| MissingLabel {
                id: record.id.clone(),
                key: BENIGN_MALIGNANT,
            })?;
        match label {
            Value::String(s) if s == "benign" => counts.benign += 1,
            Value::String(s) if s == "malignant" => counts.malignant += 1,
            _ => counts.other += 1,
        }
    }
    Ok(counts)
}

/// Persist `records` over the cache file. An empty list is not written.
/// Returns whether the file was written.
pub fn rewrite_cache(path: &Path, records: &[DetailRecord]) -> Result<bool> {
    if records.is_empty() {
        tracing::warn!("refusing to write empty metadata to {}", path.display());
        return Ok(false);
    }
    cache::save(path, records)?;
    Ok(true)
}
