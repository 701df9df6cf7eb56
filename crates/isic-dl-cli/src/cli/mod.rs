//! CLI for the isic-dl bulk downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use isic_dl_core::config::{self, IsicConfig};
use std::path::PathBuf;

use commands::{run_drop_masks, run_drop_unsegmented, run_fetch, run_prune, run_stats};

/// Top-level CLI for isic-dl.
#[derive(Debug, Parser)]
#[command(name = "isic-dl")]
#[command(about = "isic-dl: bulk downloader for the ISIC dermatology image archive", long_about = None)]
pub struct Cli {
    /// Workspace directory holding the metadata cache and asset folders (overrides config).
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Worker threads per download phase (overrides config).
    #[arg(long, global = true, value_name = "N")]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Build (or load) the metadata cache, optionally downloading images and masks.
    Fetch {
        /// Archive account user name.
        username: String,
        /// Archive account password.
        password: String,
        /// Also download full images.
        #[arg(long)]
        images: bool,
        /// Also download segmentation masks.
        #[arg(long)]
        masks: bool,
    },

    /// Remove segmentation records by ID from the metadata cache.
    DropMasks {
        /// Segmentation IDs to remove (defaults to the known-missing masks).
        ids: Vec<String>,
    },

    /// Remove records without any segmentation from the metadata cache.
    DropUnsegmented,

    /// Delete asset files that no longer belong to any cached record.
    Prune {
        /// Prune the segmentation mask folder instead of the image folder.
        #[arg(long)]
        masks: bool,
    },

    /// Print label statistics from the metadata cache.
    Stats,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, mut cfg: IsicConfig) -> IsicConfig {
        if let Some(workspace) = &self.workspace {
            cfg.workspace_path = workspace.clone();
        }
        if let Some(threads) = self.threads {
            cfg.num_threads = threads.max(1);
        }
        cfg
    }

    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = cli.apply_overrides(config::load_or_init()?);
        tracing::debug!("effective config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                username,
                password,
                images,
                masks,
            } => run_fetch(&cfg, &username, &password, images, masks)?,
            CliCommand::DropMasks { ids } => run_drop_masks(&cfg, &ids)?,
            CliCommand::DropUnsegmented => run_drop_unsegmented(&cfg)?,
            CliCommand::Prune { masks } => run_prune(&cfg, masks)?,
            CliCommand::Stats => run_stats(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
