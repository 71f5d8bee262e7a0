//! Inference backend capability.
//!
//! The pipeline only needs "load an artifact" and "given named input tensors,
//! return the requested named output tensors".  [`crate::onnx::OrtBackend`]
//! is the shipped implementation; tests drive the pipeline with canned
//! tensors.

use std::{collections::HashMap, path::Path};

use anyhow::{ensure, Result};

/// Element storage of a [`Tensor`], row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dense tensor exchanged with a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: TensorData,
}

impl Tensor {
    /// Fails when the element count does not match `shape`.
    pub fn new(shape: Vec<usize>, data: TensorData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        ensure!(
            expected == data.len(),
            "tensor shape {:?} needs {} elements, got {}",
            shape,
            expected,
            data.len()
        );
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn into_parts(self) -> (Vec<usize>, TensorData) {
        (self.shape, self.data)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Every element as `f32`, in storage order.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match &self.data {
            TensorData::F32(v) => v.clone(),
            TensorData::I32(v) => v.iter().map(|&x| x as f32).collect(),
            TensorData::I64(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }

    /// Consuming variant of [`to_f32_vec`](Self::to_f32_vec); avoids a copy
    /// for float tensors.
    pub fn into_f32_vec(self) -> Vec<f32> {
        match self.data {
            TensorData::F32(v) => v,
            other => Tensor { shape: self.shape, data: other }.to_f32_vec(),
        }
    }
}

/// Tensors keyed by graph input/output name.
pub type NamedTensors = HashMap<String, Tensor>;

/// A loaded model artifact.
///
/// `predict` takes `&mut self`: the pipeline serialises calls per handle and
/// never assumes a backend is reentrant.
pub trait InferenceModel: Send {
    /// Run the model.  The returned map should hold every name in `outputs`
    /// the model produced; a missing name is reported by the caller.
    fn predict(&mut self, inputs: NamedTensors, outputs: &[&str]) -> Result<NamedTensors>;
}

/// Something that can turn a model artifact on disk into an [`InferenceModel`].
pub trait InferenceBackend {
    fn load_model(&self, path: &Path) -> Result<Box<dyn InferenceModel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_checked() {
        assert!(Tensor::new(vec![1, 3], TensorData::I64(vec![1, 2, 3])).is_ok());
        assert!(Tensor::new(vec![2, 2], TensorData::F32(vec![0.0; 3])).is_err());
        let empty = Tensor::new(vec![1, 0], TensorData::I32(Vec::new())).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_f32_conversion_keeps_storage_order() {
        let t = Tensor::new(vec![1, 2, 2], TensorData::I64(vec![4, -3, 2, 1])).unwrap();
        assert_eq!(t.to_f32_vec(), vec![4.0, -3.0, 2.0, 1.0]);
        assert_eq!(t.into_f32_vec(), vec![4.0, -3.0, 2.0, 1.0]);

        let f = Tensor::new(vec![3], TensorData::F32(vec![0.5, -0.25, 1.0])).unwrap();
        assert_eq!(f.into_f32_vec(), vec![0.5, -0.25, 1.0]);
    }
}
