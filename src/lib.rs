//! # otosakutts
//!
//! On-device text-to-speech with a FastPitch acoustic model and a HiFiGAN
//! vocoder, driven through a pluggable inference backend (ONNX Runtime by
//! default).
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use otosakutts::OtosakuTts;
//!
//! let tts = OtosakuTts::load(Path::new("TTSModels"))?;
//!
//! // Mono f32 PCM at 22 050 Hz
//! let audio = tts.generate("Hello from Rust!")?;
//! println!("{} samples", audio.frame_length());
//!
//! // Or write a WAV file directly
//! tts.generate_to_file("Hello from Rust!", Path::new("output.wav"))?;
//! # Ok::<(), otosakutts::TtsError>(())
//! ```
//!
//! ## Model directory
//! | File            | Contents                                         |
//! |-----------------|--------------------------------------------------|
//! | `FastPitch.onnx`| acoustic model: `x` `[1, N]` ids → `spec`        |
//! | `HiFiGan.onnx`  | vocoder: `x` = `spec` → `waveform`               |
//! | `tokens.txt`    | symbol table, one symbol per non-empty line      |
//! | `cmudict.json`  | `{ "word": [["PH", "ON", "EMES"], …] }`          |
//!
//! Names can be overridden by a `config.json` in the same directory
//! (see [`ModelConfig`]).
//!
//! ## Pipeline
//! 1. **Tokenisation** — whitespace collapse, letter/digit/punctuation
//!    segmentation, dictionary phonemes or per-character fallback.
//! 2. **FastPitch** — ids `[1, N]` → spectrogram.
//! 3. **HiFiGAN** — spectrogram → waveform.
//! 4. **Buffer** — waveform copied into a [`PcmBuffer`] sized to the sample count.
//!
//! Calls are synchronous and may take a while; run them off any UI thread.

pub mod assets;
pub mod audio;
pub mod backend;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod model;
pub mod onnx;
pub mod pipeline;
pub mod symbols;
pub mod tokenize;

// Model download from HuggingFace Hub is desktop-only: mobile apps bundle
// their models and install them with `assets::install_bundle`.
#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod download;

// C FFI for iOS / Android: exposes otosaku_model_load / synthesize / free.
pub mod ffi;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use audio::{AudioFormat, PcmBuffer};
pub use backend::{InferenceBackend, InferenceModel, NamedTensors, Tensor, TensorData};
pub use config::{ModelConfig, SAMPLE_RATE};
pub use error::{TtsError, TtsResult};
pub use model::OtosakuTts;
pub use symbols::TokenId;
pub use tokenize::Tokenizer;
