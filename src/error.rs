//! Error type surfaced by every public operation.
//!
//! Construction-time variants (`Invalid*File`, `ModelLoadingFailed`,
//! `TokenizerInitializationFailed`, `InvalidConfig`, `Asset`) abort loading as a
//! whole.  Per-call variants leave an [`OtosakuTts`](crate::OtosakuTts) fully
//! usable for the next call.

/// Main error type for synthesis operations.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The backend could not instantiate a model artifact.
    #[error("Failed to load {model} model")]
    ModelLoadingFailed {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    /// Symbol table or pronunciation dictionary failed to load.
    #[error("Failed to initialize tokenizer: {reason}")]
    TokenizerInitializationFailed {
        reason: String,
        #[source]
        source: Box<TtsError>,
    },

    /// The acoustic stage produced no usable `spec` tensor.
    #[error("Failed to generate spectrogram from FastPitch")]
    SpecGenerationFailed(#[source] anyhow::Error),

    /// The vocoder stage produced no usable `waveform` tensor.
    #[error("Failed to generate waveform from HiFiGAN")]
    WaveformGenerationFailed(#[source] anyhow::Error),

    #[error("Failed to create audio buffer")]
    AudioBufferCreationFailed,

    #[error("Invalid or missing tokens file")]
    InvalidTokensFile,

    #[error("Invalid or missing dictionary file")]
    InvalidDictionaryFile,

    /// Input text is empty or whitespace-only.
    #[error("Input text is empty")]
    EmptyInput,

    /// `config.json` exists but cannot be read or parsed.
    #[error("Invalid model config: {0}")]
    InvalidConfig(#[source] anyhow::Error),

    /// Model assets could not be fetched, unpacked or located.
    #[error("Failed to prepare model assets")]
    Asset(#[source] anyhow::Error),

    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),
}

/// Convenience type alias for Results with [`TtsError`].
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Wrap a tokenizer load failure, keeping the original kind as the source.
    pub(crate) fn tokenizer_init(cause: TtsError) -> Self {
        Self::TokenizerInitializationFailed {
            reason: cause.to_string(),
            source: Box::new(cause),
        }
    }

    pub(crate) fn model_loading(model: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ModelLoadingFailed { model: model.into(), source }
    }

    /// Unwrap `TokenizerInitializationFailed` down to the load error it wraps.
    ///
    /// Every other variant returns itself.
    pub fn innermost(&self) -> &TtsError {
        match self {
            Self::TokenizerInitializationFailed { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// `true` for failures that happen per call and leave the engine usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::SpecGenerationFailed(_)
                | Self::WaveformGenerationFailed(_)
                | Self::AudioBufferCreationFailed
                | Self::Wav(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TtsError::EmptyInput.to_string(), "Input text is empty");
        assert_eq!(
            TtsError::model_loading("HiFiGAN", anyhow::anyhow!("bad graph")).to_string(),
            "Failed to load HiFiGAN model"
        );
        assert_eq!(
            TtsError::InvalidTokensFile.to_string(),
            "Invalid or missing tokens file"
        );
    }

    #[test]
    fn test_tokenizer_init_wraps_cause() {
        let err = TtsError::tokenizer_init(TtsError::InvalidDictionaryFile);
        assert_eq!(
            err.to_string(),
            "Failed to initialize tokenizer: Invalid or missing dictionary file"
        );
        assert!(matches!(err.innermost(), TtsError::InvalidDictionaryFile));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_recoverable_split() {
        assert!(TtsError::EmptyInput.is_recoverable());
        assert!(TtsError::AudioBufferCreationFailed.is_recoverable());
        assert!(!TtsError::InvalidTokensFile.is_recoverable());
        assert!(!TtsError::tokenizer_init(TtsError::InvalidTokensFile).is_recoverable());
    }
}
