//! `isic-dl drop-unsegmented` – remove records that have no segmentation.

use anyhow::Result;
use isic_dl_core::cache;
use isic_dl_core::config::IsicConfig;
use isic_dl_core::maintenance::{drop_unsegmented, rewrite_cache};

pub fn run_drop_unsegmented(cfg: &IsicConfig) -> Result<()> {
    let path = cfg.meta_path();
    let records = cache::load(&path)?;
    let before = records.len();
    let kept = drop_unsegmented(records);
    let removed = before - kept.len();
    if removed > 0 && !rewrite_cache(&path, &kept)? {
        println!("Every record lacks a segmentation; cache left unchanged");
        return Ok(());
    }
    println!("Removed {} records, {} remain", removed, kept.len());
    Ok(())
}
