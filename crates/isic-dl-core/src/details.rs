//! Per-image detail and segmentation lookups.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::{fetch, Endpoint, IsicSource};
use crate::batch::run_partitioned;
use crate::model::{CatalogEntry, DetailRecord, Segmentation};

#[derive(Debug, Deserialize)]
struct ImageDetail {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Fetch the detail blob and segmentation list of one catalog entry.
pub fn fetch_detail<S: IsicSource + ?Sized>(source: &S, entry: &CatalogEntry) -> Result<DetailRecord> {
    let detail: ImageDetail = fetch(source, &Endpoint::image_detail(&entry.id))
        .with_context(|| format!("detail of image {}", entry.id))?;
    let segmentation: Vec<Segmentation> = fetch(source, &Endpoint::segmentations_of(&entry.id))
        .with_context(|| format!("segmentations of image {}", entry.id))?;

    let mut fields = detail.fields;
    // The listing payload may carry a stale copy; the detail response wins.
    fields.remove("segmentation");
    Ok(DetailRecord {
        id: detail.id,
        fields,
        segmentation,
    })
}

/// Fetch details for all `entries` over `workers` threads, preserving input order.
///
/// Always hits the network; there is no per-item skip for metadata.
pub fn fetch_details<S: IsicSource + ?Sized>(
    source: &S,
    entries: &[CatalogEntry],
    workers: usize,
) -> Result<Vec<DetailRecord>> {
    tracing::info!("fetching details for {} images", entries.len());
    let records = run_partitioned(entries, workers, |ctx, entry| {
        let record = fetch_detail(source, entry)?;
        tracing::debug!(
            "worker {}: details {}/{} ({}%) image={} segmentations={}",
            ctx.worker,
            ctx.position + 1,
            ctx.total,
            ctx.percent_done(),
            record.id,
            record.segmentation.len()
        );
        Ok(record)
    })?;
    tracing::info!("fetched details for {} images", records.len());
    Ok(records)
}
