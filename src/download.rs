//! HuggingFace Hub asset source.
//!
//! Downloads the acoustic model, vocoder, symbol table and dictionary from a
//! HuggingFace repository and hands back the snapshot directory that holds
//! them.  Files are cached in the hub cache (`~/.cache/huggingface/hub` by
//! default), so later runs work offline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use hf_hub::api::sync::Api;
use tracing::info;

use crate::{assets::AssetSource, config::ModelConfig};

/// A HuggingFace repository laid out like a model directory.
#[derive(Debug, Clone)]
pub struct HubAssets {
    repo_id: String,
    config: ModelConfig,
}

impl HubAssets {
    /// `repo_id` is e.g. `"someone/fastpitch-hifigan-en"`.
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self { repo_id: repo_id.into(), config: ModelConfig::default() }
    }

    /// Fetch these file names instead of the defaults.  Load the engine with
    /// the same config via [`OtosakuTts::load_with_config`](crate::OtosakuTts::load_with_config).
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }
}

impl AssetSource for HubAssets {
    fn model_dir(&self) -> Result<PathBuf> {
        let api = Api::new().context("Failed to initialise HuggingFace Hub client")?;
        let repo = api.model(self.repo_id.clone());

        let mut dir = None;
        for name in self.config.required_files() {
            info!(repo = %self.repo_id, file = name, "fetching");
            let path = repo
                .get(name)
                .with_context(|| format!("Failed to download '{}' from '{}'", name, self.repo_id))?;
            // Every file of one revision lands in the same snapshot directory.
            dir = path.parent().map(PathBuf::from);
        }
        dir.with_context(|| format!("No files resolved for '{}'", self.repo_id))
    }
}
