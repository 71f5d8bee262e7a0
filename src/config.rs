//! Model directory layout and stage I/O names.
//!
//! A model directory holds four files under fixed names.  An optional
//! `config.json` next to them may override any field; missing fields keep
//! their defaults:
//!
//! ```json
//! { "acoustic_model": "fastpitch.onnx", "id_dtype": "int32" }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Sample rate of the HiFiGAN vocoder output.
pub const SAMPLE_RATE: u32 = 22_050;

/// Integer type used to pack token ids for the acoustic model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdDType {
    Int32,
    #[default]
    Int64,
}

/// Deserialised `config.json` of a model directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Acoustic (FastPitch) model artifact.
    pub acoustic_model: String,
    /// Vocoder (HiFiGAN) model artifact.
    pub vocoder_model: String,
    /// Newline-delimited symbol table.
    pub tokens: String,
    /// JSON pronunciation dictionary.
    pub dictionary: String,

    pub acoustic_input: String,
    pub acoustic_output: String,
    pub vocoder_input: String,
    pub vocoder_output: String,

    pub sample_rate: u32,
    pub id_dtype: IdDType,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            acoustic_model: "FastPitch.onnx".into(),
            vocoder_model: "HiFiGan.onnx".into(),
            tokens: "tokens.txt".into(),
            dictionary: "cmudict.json".into(),
            acoustic_input: "x".into(),
            acoustic_output: "spec".into(),
            vocoder_input: "x".into(),
            vocoder_output: "waveform".into(),
            sample_rate: SAMPLE_RATE,
            id_dtype: IdDType::Int64,
        }
    }
}

impl ModelConfig {
    /// Name of the optional override file inside a model directory.
    pub const FILE_NAME: &'static str = "config.json";

    /// Read `<dir>/config.json`, or fall back to defaults when it is absent.
    pub fn load_or_default(dir: &Path) -> TtsResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Cannot read config: {}", path.display()))
            .map_err(TtsError::InvalidConfig)?;
        let config = Self::from_slice(&bytes)?;
        debug!(path = %path.display(), ?config, "loaded model config");
        Ok(config)
    }

    pub fn from_slice(bytes: &[u8]) -> TtsResult<Self> {
        serde_json::from_slice(bytes)
            .context("Failed to parse config.json")
            .map_err(TtsError::InvalidConfig)
    }

    /// The four files a complete model directory must contain.
    pub fn required_files(&self) -> [&str; 4] {
        [
            self.acoustic_model.as_str(),
            self.vocoder_model.as_str(),
            self.tokens.as_str(),
            self.dictionary.as_str(),
        ]
    }

    pub fn acoustic_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.acoustic_model)
    }

    pub fn vocoder_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.vocoder_model)
    }

    pub fn tokens_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.tokens)
    }

    pub fn dictionary_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.dictionary)
    }
}
