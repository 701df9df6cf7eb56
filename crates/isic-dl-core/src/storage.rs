//! Temp-file naming and finalize for files written by the pipeline.
//!
//! Assets and the metadata cache are written to `<name>.part` first and
//! renamed into place once complete, so an interrupted write never leaves a
//! file that the "already downloaded" check would accept.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.jpg` → `a.jpg.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Rename a completed temp file over `final_path`.
pub fn finalize(temp_path: &Path, final_path: &Path) -> Result<()> {
    std::fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            final_path.display()
        )
    })
}

/// Write `data` to `final_path` through a temp file.
pub fn write_replace(final_path: &Path, data: &[u8]) -> Result<()> {
    let tp = temp_path(final_path);
    std::fs::write(&tp, data).with_context(|| format!("write {}", tp.display()))?;
    finalize(&tp, final_path)
}
