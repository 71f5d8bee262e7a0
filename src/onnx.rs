//! ONNX Runtime backend.
//!
//! Uses [`ort`] (ONNX Runtime Rust bindings).  The FastPitch and HiFiGAN
//! exports each take a single input named `x`:
//!
//! | Model      | Input `x`                 | Output                  |
//! |------------|---------------------------|-------------------------|
//! | FastPitch  | `[1, seq_len]` int64/int32| `spec` `[1, 80, frames]`|
//! | HiFiGAN    | `spec` as produced        | `waveform` `[1, T]`     |

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ort::{
    session::Session,
    value::{DynValue, Tensor as OrtTensor},
};
use tracing::debug;

use crate::backend::{InferenceBackend, InferenceModel, NamedTensors, Tensor, TensorData};

/// Loads `.onnx` artifacts into ORT sessions.
#[derive(Debug, Clone, Default)]
pub struct OrtBackend {
    intra_threads: Option<usize>,
}

impl OrtBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit ORT's intra-op thread pool (useful on mobile).
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(&self, path: &Path) -> Result<Box<dyn InferenceModel>> {
        let mut builder = Session::builder().context("Failed to create ORT session builder")?;
        if let Some(threads) = self.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| anyhow!("Cannot set intra-op threads: {e}"))?;
        }
        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Cannot load ONNX model: {}", path.display()))?;
        debug!(path = %path.display(), "ORT session ready");
        Ok(Box::new(OrtModel { session }))
    }
}

/// One ORT session.
pub struct OrtModel {
    session: Session,
}

impl InferenceModel for OrtModel {
    fn predict(&mut self, inputs: NamedTensors, outputs: &[&str]) -> Result<NamedTensors> {
        let inputs = inputs
            .into_iter()
            .map(|(name, tensor)| {
                let value = to_ort(tensor)
                    .with_context(|| format!("Failed to build '{}' tensor", name))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<(String, DynValue)>>>()?;

        let run = self.session.run(inputs).context("ONNX inference failed")?;

        let mut named = NamedTensors::new();
        for &name in outputs {
            if let Some(value) = run.get(name) {
                let tensor = from_ort(value)
                    .with_context(|| format!("Failed to extract '{}' tensor", name))?;
                named.insert(name.to_string(), tensor);
            }
        }
        Ok(named)
    }
}

fn to_ort(tensor: Tensor) -> Result<DynValue> {
    let (shape, data) = tensor.into_parts();
    Ok(match data {
        TensorData::I64(v) => OrtTensor::<i64>::from_array((shape, v))?.into_dyn(),
        TensorData::I32(v) => OrtTensor::<i32>::from_array((shape, v))?.into_dyn(),
        TensorData::F32(v) => OrtTensor::<f32>::from_array((shape, v))?.into_dyn(),
    })
}

fn dims(shape: &[i64]) -> Vec<usize> {
    shape.iter().map(|&d| d.max(0) as usize).collect()
}

fn from_ort(value: &DynValue) -> Result<Tensor> {
    if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
        return Tensor::new(dims(shape), TensorData::F32(data.to_vec()));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
        return Tensor::new(dims(shape), TensorData::I64(data.to_vec()));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<i32>() {
        return Tensor::new(dims(shape), TensorData::I32(data.to_vec()));
    }
    bail!("unsupported output element type {:?}", value.dtype())
}
