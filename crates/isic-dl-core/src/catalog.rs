//! Paginated catalog fetch.

use anyhow::{Context, Result};

use crate::api::{fetch, Endpoint, IsicSource};
use crate::model::CatalogEntry;

/// Fetch the whole image listing, `page_size` entries at a time.
///
/// Each request asks for the page starting at the number of entries seen so
/// far; pages are appended in arrival order. A page shorter than `page_size`
/// (including an empty one) is the last. Any failed request aborts the fetch.
pub fn fetch_catalog<S: IsicSource + ?Sized>(
    source: &S,
    page_size: usize,
) -> Result<Vec<CatalogEntry>> {
    if page_size == 0 {
        anyhow::bail!("catalog page size must be at least 1");
    }

    tracing::info!("fetching image catalog ({} per page)", page_size);
    let mut entries: Vec<CatalogEntry> = Vec::new();
    loop {
        let endpoint = Endpoint::images_page(page_size, entries.len());
        let page: Vec<CatalogEntry> = fetch(source, &endpoint)
            .with_context(|| format!("catalog page at offset {}", entries.len()))?;
        let received = page.len();
        entries.extend(page);
        tracing::info!("catalog: {} entries fetched", entries.len());
        if received < page_size {
            break;
        }
    }
    Ok(entries)
}
