//! Synthesis engine: owns the tokenizer and both loaded models.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let tts = otosakutts::OtosakuTts::load(Path::new("TTSModels"))?;
//! let audio = tts.generate("Hello from Rust!")?;
//! audio.write_wav(Path::new("hello.wav"))?;
//! # Ok::<(), otosakutts::TtsError>(())
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::{
    assets::AssetSource,
    audio::PcmBuffer,
    backend::InferenceBackend,
    config::ModelConfig,
    error::{TtsError, TtsResult},
    onnx::OrtBackend,
    pipeline::InferencePipeline,
    symbols::TokenId,
    tokenize::Tokenizer,
};

/// The main TTS handle.
///
/// Immutable after construction; `generate` may be called repeatedly and from
/// several threads.  Each model serialises its own inference calls.
pub struct OtosakuTts {
    tokenizer: Tokenizer,
    pipeline: InferencePipeline,
    config: ModelConfig,
}

impl OtosakuTts {
    /// Load from a model directory with the ONNX Runtime backend.
    ///
    /// File names come from `<dir>/config.json` when present, else the
    /// defaults (`FastPitch.onnx`, `HiFiGan.onnx`, `tokens.txt`, `cmudict.json`).
    pub fn load(dir: &Path) -> TtsResult<Self> {
        let config = ModelConfig::load_or_default(dir)?;
        Self::load_with_config(dir, config)
    }

    pub fn load_with_config(dir: &Path, config: ModelConfig) -> TtsResult<Self> {
        Self::load_with_backend(dir, config, &OrtBackend::default())
    }

    /// Resolve a model directory from `source`, then [`load`](Self::load) it.
    pub fn from_source(source: &dyn AssetSource) -> TtsResult<Self> {
        let dir = source.model_dir().map_err(TtsError::Asset)?;
        Self::load(&dir)
    }

    /// Like [`from_source`](Self::from_source) with explicit file names, for
    /// sources (such as a hub snapshot) that carry no `config.json`.
    pub fn from_source_with_config(
        source: &dyn AssetSource,
        config: ModelConfig,
    ) -> TtsResult<Self> {
        let dir = source.model_dir().map_err(TtsError::Asset)?;
        Self::load_with_config(&dir, config)
    }

    /// Load with an arbitrary inference backend.
    ///
    /// The tokenizer files are read first, so a bad symbol table or dictionary
    /// fails before any model is handed to the backend.  Construction is
    /// all-or-nothing.
    pub fn load_with_backend(
        dir: &Path,
        config: ModelConfig,
        backend: &dyn InferenceBackend,
    ) -> TtsResult<Self> {
        info!(dir = %dir.display(), "loading TTS models");

        let tokenizer = Tokenizer::load(&config.tokens_path(dir), &config.dictionary_path(dir))
            .map_err(TtsError::tokenizer_init)?;

        let acoustic = backend
            .load_model(&config.acoustic_path(dir))
            .map_err(|e| TtsError::model_loading("FastPitch", e))?;
        let vocoder = backend
            .load_model(&config.vocoder_path(dir))
            .map_err(|e| TtsError::model_loading("HiFiGAN", e))?;

        let pipeline = InferencePipeline::new(acoustic, vocoder, &config);
        info!(
            symbols = tokenizer.symbols().len(),
            words = tokenizer.dictionary().len(),
            "TTS models loaded"
        );
        Ok(Self { tokenizer, pipeline, config })
    }

    /// Synthesize `text` into a fresh mono buffer at the model sample rate.
    ///
    /// Empty or whitespace-only text fails with [`TtsError::EmptyInput`]
    /// before any inference runs.
    pub fn generate(&self, text: &str) -> TtsResult<PcmBuffer> {
        if text.trim().is_empty() {
            return Err(TtsError::EmptyInput);
        }
        let ids = self.tokenizer.encode(text);
        debug!(tokens = ids.len(), "text tokenized");
        let audio = self.pipeline.synthesize(&ids)?;
        debug!(samples = audio.frame_length(), seconds = audio.duration_secs(), "synthesized");
        Ok(audio)
    }

    /// Synthesize `text` and write a 16-bit PCM WAV file.
    pub fn generate_to_file(&self, text: &str, output_path: &Path) -> TtsResult<()> {
        self.generate(text)?.write_wav(output_path)
    }

    /// Token ids the acoustic model would receive for `text`.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        self.tokenizer.encode(text)
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.pipeline.format().sample_rate
    }
}
