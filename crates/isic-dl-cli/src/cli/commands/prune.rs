//! `isic-dl prune [--masks]` – delete asset files with no record in the cache.

use anyhow::Result;
use isic_dl_core::cache;
use isic_dl_core::config::IsicConfig;
use isic_dl_core::maintenance::{image_file_names, mask_file_names, prune_orphans};

pub fn run_prune(cfg: &IsicConfig, masks: bool) -> Result<()> {
    let records = cache::load(&cfg.meta_path())?;
    let (dir, keep) = if masks {
        (cfg.segmentation_path(), mask_file_names(&records))
    } else {
        (cfg.images_path(), image_file_names(&records))
    };
    if !dir.is_dir() {
        println!("Nothing to prune: {} does not exist", dir.display());
        return Ok(());
    }
    let deleted = prune_orphans(&dir, &keep)?;
    for path in &deleted {
        println!("{} deleted", path.display());
    }
    println!("Pruned {} files from {}", deleted.len(), dir.display());
    Ok(())
}
