//! `isic-dl fetch <user> <password>` – metadata cache, then optional asset phases.

use anyhow::{Context, Result};
use isic_dl_core::api::IsicApi;
use isic_dl_core::assets::{download_images, download_masks};
use isic_dl_core::cache;
use isic_dl_core::config::IsicConfig;

pub fn run_fetch(
    cfg: &IsicConfig,
    username: &str,
    password: &str,
    images: bool,
    masks: bool,
) -> Result<()> {
    let api = IsicApi::login(cfg, username, password).context("login")?;

    let records = cache::load_or_fetch(&api, cfg)?;
    println!("Metadata: {} images ({})", records.len(), cfg.meta_path().display());

    // Phases run one after another; each joins all of its workers first.
    if images {
        let summary = download_images(&api, &records, &cfg.images_path(), cfg.num_threads)?;
        println!(
            "Images: {} downloaded, {} already present ({} bytes)",
            summary.downloaded, summary.skipped, summary.bytes
        );
    }
    if masks {
        let summary = download_masks(&api, &records, &cfg.segmentation_path(), cfg.num_threads)?;
        println!(
            "Masks: {} downloaded, {} already present ({} bytes)",
            summary.downloaded, summary.skipped, summary.bytes
        );
    }
    Ok(())
}
