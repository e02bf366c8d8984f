//! Classifier collaborator for the averaging loop

use crate::models::loader::LoadedModel;
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array2, ArrayView4};
use tracing::debug;

/// Batch inference capability: a stack of preprocessed images in, one row of
/// raw (unnormalized) per-class scores per image out.
pub trait Classifier {
    fn forward(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array2<f32>>;
}

/// ONNX Runtime backed classifier
pub struct OnnxClassifier {
    model: LoadedModel,
    num_classes: usize,
}

impl OnnxClassifier {
    /// Wrap a loaded model, fixing the expected class count
    pub fn new(model: LoadedModel, num_classes: usize) -> Self {
        Self { model, num_classes }
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// Training epoch restored from the checkpoint
    pub fn epoch(&self) -> u64 {
        self.model.epoch
    }
}

impl Classifier for OnnxClassifier {
    fn forward(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array2<f32>> {
        use ort::value::Tensor;

        let (batch_len, channels, height, width) = batch.dim();
        let shape = vec![
            batch_len as i64,
            channels as i64,
            height as i64,
            width as i64,
        ];
        let data: Vec<f32> = batch.iter().copied().collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let outputs = self
            .model
            .session
            .run(ort::inputs![&self.model.input_name => input_tensor])?;

        // Prefer the probed output name; fall back to the first float tensor
        // that is not a label output.
        let extracted = outputs
            .get(self.model.output_name.as_str())
            .and_then(|output| output.try_extract_tensor::<f32>().ok())
            .or_else(|| {
                outputs.keys().find_map(|name| {
                    if name.contains("label") {
                        return None;
                    }
                    outputs.get(name)?.try_extract_tensor::<f32>().ok()
                })
            });

        let (out_shape, out_data) = extracted.ok_or_else(|| {
            anyhow!(
                "model \"{}\" produced no float score output",
                self.model.name
            )
        })?;

        let dims: Vec<i64> = out_shape.iter().copied().collect();
        if dims.len() != 2 || dims[0] as usize != batch_len {
            bail!(
                "model \"{}\" returned scores of shape {:?}, expected [{}, {}]",
                self.model.name,
                dims,
                batch_len,
                self.num_classes
            );
        }
        let classes = dims[1] as usize;
        if classes != self.num_classes {
            bail!(
                "model \"{}\" emits {} classes, expected {}",
                self.model.name,
                classes,
                self.num_classes
            );
        }

        debug!(batch = batch_len, classes, "Raw scores extracted");

        Array2::from_shape_vec((batch_len, classes), out_data.to_vec())
            .context("score matrix does not match its reported shape")
    }
}

#[cfg(test)]
mod tests {
    // Running the ONNX path requires real checkpoint files; the forward
    // contract is exercised through the averager's stub classifiers.
}
