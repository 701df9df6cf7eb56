use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/isic-dl/config.toml`.
///
/// Passed explicitly into every pipeline entry point; CLI flags may override
/// individual fields after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsicConfig {
    /// Base URL of the archive REST API; endpoint paths are joined onto it.
    pub api_base_url: String,
    /// Root directory holding the metadata cache and asset subdirectories.
    pub workspace_path: PathBuf,
    /// File name of the metadata cache inside the workspace.
    pub images_meta: String,
    /// Subdirectory (inside the workspace) for full images.
    pub images_dir: String,
    /// Subdirectory (inside the workspace) for segmentation masks.
    pub segmentation_dir: String,
    /// Number of worker threads per batch phase.
    pub num_threads: usize,
    /// Catalog page size requested from the listing endpoint.
    pub page_size: usize,
    /// TCP connect timeout for API calls, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for IsicConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://isic-archive.com/api/v1/".to_string(),
            workspace_path: PathBuf::from("workspace"),
            images_meta: "images_meta.json".to_string(),
            images_dir: "images".to_string(),
            segmentation_dir: "segmentation".to_string(),
            num_threads: 8,
            page_size: 30000,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl IsicConfig {
    /// Path of the metadata cache file.
    pub fn meta_path(&self) -> PathBuf {
        self.workspace_path.join(&self.images_meta)
    }

    pub fn images_path(&self) -> PathBuf {
        self.workspace_path.join(&self.images_dir)
    }

    pub fn segmentation_path(&self) -> PathBuf {
        self.workspace_path.join(&self.segmentation_dir)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("isic-dl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<IsicConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = IsicConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: IsicConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
