//! Image and segmentation-mask downloads.
//!
//! Each asset lands at `{dir}/{id}.jpg`. An existing file counts as already
//! downloaded and is never requested again.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::api::{Endpoint, IsicSource};
use crate::batch::{run_partitioned, WorkerCtx};
use crate::model::DetailRecord;

/// Outcome of one asset phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes: u64,
}

impl AssetSummary {
    fn add(mut self, other: AssetSummary) -> Self {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.bytes += other.bytes;
        self
    }
}

/// Download `endpoint` into `dest` unless `dest` already exists.
fn fetch_asset<S: IsicSource + ?Sized>(source: &S, endpoint: &Endpoint, dest: &Path) -> Result<AssetSummary> {
    if dest.exists() {
        return Ok(AssetSummary {
            skipped: 1,
            ..AssetSummary::default()
        });
    }
    let bytes = source
        .download(endpoint, dest)
        .with_context(|| format!("download {} to {}", endpoint, dest.display()))?;
    Ok(AssetSummary {
        downloaded: 1,
        bytes,
        ..AssetSummary::default()
    })
}

fn log_progress(kind: &str, ctx: WorkerCtx, id: &str) {
    tracing::debug!(
        "worker {}: {} {}/{} ({}%) id={}",
        ctx.worker,
        kind,
        ctx.position + 1,
        ctx.total,
        ctx.percent_done(),
        id
    );
}

/// Download the full image of every record into `dir`.
///
/// Records whose image file already exists are filtered out before
/// partitioning, so work is spread over the missing images only.
pub fn download_images<S: IsicSource + ?Sized>(
    source: &S,
    records: &[DetailRecord],
    dir: &Path,
    workers: usize,
) -> Result<AssetSummary> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let missing: Vec<&DetailRecord> = records
        .iter()
        .filter(|r| !dir.join(r.image_file_name()).exists())
        .collect();
    let already = records.len() - missing.len();
    tracing::info!(
        "images: {} to download, {} already present in {}",
        missing.len(),
        already,
        dir.display()
    );

    let outcomes = run_partitioned(&missing, workers, |ctx, record| {
        let dest = dir.join(record.image_file_name());
        let outcome = fetch_asset(source, &Endpoint::image_file(&record.id), &dest)?;
        log_progress("image", ctx, &record.id);
        Ok(outcome)
    })?;

    let summary = outcomes.into_iter().fold(
        AssetSummary {
            skipped: already,
            ..AssetSummary::default()
        },
        AssetSummary::add,
    );
    tracing::info!("images done: {:?}", summary);
    Ok(summary)
}

/// Download every segmentation mask of every record into `dir`.
pub fn download_masks<S: IsicSource + ?Sized>(
    source: &S,
    records: &[DetailRecord],
    dir: &Path,
    workers: usize,
) -> Result<AssetSummary> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let total_masks: usize = records.iter().map(|r| r.segmentation.len()).sum();
    tracing::info!(
        "masks: {} masks across {} images into {}",
        total_masks,
        records.len(),
        dir.display()
    );

    let outcomes = run_partitioned(records, workers, |ctx, record| {
        let mut summary = AssetSummary::default();
        for segmentation in &record.segmentation {
            let dest = dir.join(segmentation.mask_file_name());
            let outcome = fetch_asset(source, &Endpoint::mask_file(&segmentation.id), &dest)?;
            summary = summary.add(outcome);
        }
        log_progress("masks of image", ctx, &record.id);
        Ok(summary)
    })?;

    let summary = outcomes
        .into_iter()
        .fold(AssetSummary::default(), AssetSummary::add);
    tracing::info!("masks done: {:?}", summary);
    Ok(summary)
}
