//! `isic-dl stats` – label statistics over the metadata cache.

use anyhow::Result;
use isic_dl_core::cache;
use isic_dl_core::config::IsicConfig;
use isic_dl_core::maintenance::{benign_malignant, count_labeled};

pub fn run_stats(cfg: &IsicConfig) -> Result<()> {
    let records = cache::load(&cfg.meta_path())?;
    println!("Images: {}", records.len());
    println!("Num: {}", count_labeled(&records));
    let counts = benign_malignant(&records)?;
    println!("Benign: {}", counts.benign);
    println!("Malignant: {}", counts.malignant);
    if counts.other > 0 {
        println!("Other: {}", counts.other);
    }
    Ok(())
}
