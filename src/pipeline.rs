//! Two-stage inference: token ids → FastPitch → HiFiGAN → [`PcmBuffer`].
//!
//! Stage 2 consumes stage 1's output tensor unmodified.  Each model handle sits
//! behind its own mutex, so concurrent callers are serialised per stage and
//! the backend never sees overlapping `predict` calls on one handle.

use std::{
    sync::{Mutex, PoisonError},
    time::Instant,
};

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    audio::{AudioFormat, PcmBuffer},
    backend::{InferenceModel, NamedTensors, Tensor, TensorData},
    config::{IdDType, ModelConfig},
    error::{TtsError, TtsResult},
    symbols::TokenId,
};

/// Input/output names of one model stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageIo {
    pub input: String,
    pub output: String,
}

struct Stage {
    name: &'static str,
    model: Mutex<Box<dyn InferenceModel>>,
    io: StageIo,
}

impl Stage {
    fn run(&self, input: Tensor) -> Result<Tensor> {
        let started = Instant::now();
        let in_shape = input.shape().to_vec();
        let inputs = NamedTensors::from([(self.io.input.clone(), input)]);

        // A panic inside a previous predict leaves no state we rely on.
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let mut outputs = model
            .predict(inputs, &[self.io.output.as_str()])
            .with_context(|| format!("{} prediction failed", self.name))?;
        drop(model);

        let output = outputs
            .remove(&self.io.output)
            .with_context(|| format!("{} produced no '{}' output", self.name, self.io.output))?;
        debug!(
            stage = self.name,
            ?in_shape,
            out_shape = ?output.shape(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stage complete"
        );
        Ok(output)
    }
}

/// Acoustic model + vocoder pair.
pub struct InferencePipeline {
    acoustic: Stage,
    vocoder: Stage,
    id_dtype: IdDType,
    format: AudioFormat,
}

impl InferencePipeline {
    pub fn new(
        acoustic: Box<dyn InferenceModel>,
        vocoder: Box<dyn InferenceModel>,
        config: &ModelConfig,
    ) -> Self {
        Self {
            acoustic: Stage {
                name: "FastPitch",
                model: Mutex::new(acoustic),
                io: StageIo {
                    input: config.acoustic_input.clone(),
                    output: config.acoustic_output.clone(),
                },
            },
            vocoder: Stage {
                name: "HiFiGAN",
                model: Mutex::new(vocoder),
                io: StageIo {
                    input: config.vocoder_input.clone(),
                    output: config.vocoder_output.clone(),
                },
            },
            id_dtype: config.id_dtype,
            format: AudioFormat::mono(config.sample_rate),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Run both stages on an encoded utterance.
    pub fn synthesize(&self, ids: &[TokenId]) -> TtsResult<PcmBuffer> {
        let input = ids_to_tensor(ids, self.id_dtype).map_err(TtsError::SpecGenerationFailed)?;

        let spec = self.acoustic.run(input).map_err(TtsError::SpecGenerationFailed)?;
        let waveform = self.vocoder.run(spec).map_err(TtsError::WaveformGenerationFailed)?;

        let samples = waveform.into_f32_vec();
        PcmBuffer::from_samples(self.format, &samples)
    }
}

/// Pack ids as a `(1, len)` integer tensor.
pub fn ids_to_tensor(ids: &[TokenId], dtype: IdDType) -> Result<Tensor> {
    let data = match dtype {
        IdDType::Int64 => TensorData::I64(ids.iter().map(|&id| i64::from(id)).collect()),
        IdDType::Int32 => TensorData::I32(
            ids.iter()
                .map(|&id| i32::try_from(id).context("token id exceeds int32"))
                .collect::<Result<_>>()?,
        ),
    };
    Tensor::new(vec![1, ids.len()], data)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned {
        output: &'static str,
        tensor: Option<Tensor>,
    }

    impl InferenceModel for Canned {
        fn predict(&mut self, _inputs: NamedTensors, _outputs: &[&str]) -> Result<NamedTensors> {
            Ok(self.tensor.clone().map(|t| (self.output.to_string(), t)).into_iter().collect())
        }
    }

    fn spec() -> Tensor {
        Tensor::new(vec![1, 2, 2], TensorData::F32(vec![0.0; 4])).unwrap()
    }

    #[test]
    fn test_ids_to_tensor() {
        let t = ids_to_tensor(&[2, 3, 4], IdDType::Int64).unwrap();
        assert_eq!(t.shape(), &[1, 3]);
        assert_eq!(t.data(), &TensorData::I64(vec![2, 3, 4]));

        let t = ids_to_tensor(&[7], IdDType::Int32).unwrap();
        assert_eq!(t.data(), &TensorData::I32(vec![7]));

        assert!(ids_to_tensor(&[u32::MAX], IdDType::Int32).is_err());
    }

    #[test]
    fn test_missing_spec_output() {
        let p = InferencePipeline::new(
            Box::new(Canned { output: "spec", tensor: None }),
            Box::new(Canned { output: "waveform", tensor: None }),
            &ModelConfig::default(),
        );
        assert!(matches!(p.synthesize(&[1, 2]), Err(TtsError::SpecGenerationFailed(_))));
    }

    #[test]
    fn test_wrong_output_name_is_missing() {
        let p = InferencePipeline::new(
            Box::new(Canned { output: "mel", tensor: Some(spec()) }),
            Box::new(Canned { output: "waveform", tensor: None }),
            &ModelConfig::default(),
        );
        assert!(matches!(p.synthesize(&[1]), Err(TtsError::SpecGenerationFailed(_))));
    }

    #[test]
    fn test_missing_waveform_output() {
        let p = InferencePipeline::new(
            Box::new(Canned { output: "spec", tensor: Some(spec()) }),
            Box::new(Canned { output: "waveform", tensor: None }),
            &ModelConfig::default(),
        );
        assert!(matches!(p.synthesize(&[1]), Err(TtsError::WaveformGenerationFailed(_))));
    }

    #[test]
    fn test_buffer_matches_waveform_element_count() {
        let wave = Tensor::new(vec![1, 5], TensorData::F32(vec![0.1, 0.2, 0.3, 0.4, 0.5])).unwrap();
        let p = InferencePipeline::new(
            Box::new(Canned { output: "spec", tensor: Some(spec()) }),
            Box::new(Canned { output: "waveform", tensor: Some(wave) }),
            &ModelConfig::default(),
        );
        let buf = p.synthesize(&[1, 2, 3]).unwrap();
        assert_eq!(buf.frame_length(), 5);
        assert_eq!(buf.frame_capacity(), 5);
        assert_eq!(buf.sample_rate(), 22_050);
        assert_eq!(buf.samples(), &[0.1, 0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn test_empty_waveform_fails_buffer_creation() {
        let wave = Tensor::new(vec![1, 0], TensorData::F32(Vec::new())).unwrap();
        let p = InferencePipeline::new(
            Box::new(Canned { output: "spec", tensor: Some(spec()) }),
            Box::new(Canned { output: "waveform", tensor: Some(wave) }),
            &ModelConfig::default(),
        );
        assert!(matches!(p.synthesize(&[1]), Err(TtsError::AudioBufferCreationFailed)));
    }
}
