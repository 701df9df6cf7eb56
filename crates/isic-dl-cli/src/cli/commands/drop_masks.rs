//! `isic-dl drop-masks [ID...]` – remove segmentation records from the cache.

use anyhow::Result;
use isic_dl_core::cache;
use isic_dl_core::config::IsicConfig;
use isic_dl_core::maintenance::{drop_segmentations, rewrite_cache, DEFAULT_MISSING_MASKS};

pub fn run_drop_masks(cfg: &IsicConfig, ids: &[String]) -> Result<()> {
    let ids: Vec<&str> = if ids.is_empty() {
        DEFAULT_MISSING_MASKS.to_vec()
    } else {
        ids.iter().map(String::as_str).collect()
    };

    let path = cfg.meta_path();
    let mut records = cache::load(&path)?;
    let removed = drop_segmentations(&mut records, &ids);
    if removed > 0 {
        rewrite_cache(&path, &records)?;
    }
    println!("Removed {} segmentation records", removed);
    Ok(())
}
