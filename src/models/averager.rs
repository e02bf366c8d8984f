//! Repeated-augmentation score averaging

use crate::augment::Augment;
use crate::dataset::ImageStore;
use crate::metrics::InferenceMetrics;
use crate::models::classifier::Classifier;
use anyhow::{bail, ensure, Context, Result};
use ndarray::{stack, Array2, Axis};
use std::time::Instant;
use tracing::info;

/// Numerically stable log-softmax over every row of a raw score matrix.
///
/// Each row's maximum is subtracted before the log-sum-exp so arbitrarily
/// large finite scores cannot overflow the exponentials; the shift cancels in
/// the result. Computation is carried out in f64.
pub fn log_softmax_batch(scores: &Array2<f32>) -> Array2<f64> {
    let mut out = scores.mapv(f64::from);
    for mut row in out.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let log_sum = row.iter().map(|&v| (v - max).exp()).sum::<f64>().ln();
        row.mapv_inplace(|v| v - max - log_sum);
    }
    out
}

/// Averages per-image log-probabilities across repeated stochastic
/// augmentation passes.
///
/// For each consecutive batch a zeroed accumulator is summed over `repeats`
/// independent transform+forward passes and divided by the repeat count. Rows
/// come out in dataset order. The final batch is truncated when the dataset
/// length is not a multiple of the batch size.
pub struct TtaAverager {
    batch_size: usize,
    repeats: usize,
    progress_every: usize,
}

impl TtaAverager {
    /// Create an averager; zero batch size or repeat count is rejected
    pub fn new(batch_size: usize, repeats: usize, progress_every: usize) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch size must be positive");
        }
        if repeats == 0 {
            bail!("repeat count must be positive");
        }
        Ok(Self {
            batch_size,
            repeats,
            progress_every,
        })
    }

    /// Run the full dataset through the classifier, returning one averaged
    /// log-probability row per image, in dataset order.
    pub fn run<C, A>(
        &self,
        store: &ImageStore,
        classifier: &mut C,
        augment: &mut A,
        num_classes: usize,
        metrics: &mut InferenceMetrics,
    ) -> Result<Vec<Vec<f64>>>
    where
        C: Classifier,
        A: Augment,
    {
        let total = store.len();
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(total);
        let mut batch_index = 0usize;
        let mut start = 0usize;

        while start < total {
            let end = (start + self.batch_size).min(total);
            let batch_len = end - start;
            let batch_started = Instant::now();

            let mut accumulator = Array2::<f64>::zeros((batch_len, num_classes));
            for _ in 0..self.repeats {
                let tensors = (start..end)
                    .map(|index| Ok(augment.transform(&store.image(index)?)))
                    .collect::<Result<Vec<_>>>()?;
                let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();
                let batch =
                    stack(Axis(0), &views).context("augmented tensors disagree on shape")?;

                let scores = classifier.forward(batch.view())?;
                ensure!(
                    scores.dim() == (batch_len, num_classes),
                    "classifier returned scores of shape {:?} for a {}x{} batch",
                    scores.dim(),
                    batch_len,
                    num_classes
                );

                accumulator += &log_softmax_batch(&scores);
                metrics.record_pass();
            }
            accumulator /= self.repeats as f64;

            for row in accumulator.rows() {
                rows.push(row.to_vec());
            }

            metrics.record_batch(batch_started.elapsed(), batch_len);
            batch_index += 1;
            if self.progress_every > 0 && batch_index % self.progress_every == 0 {
                info!(
                    images = rows.len(),
                    total,
                    throughput = format!("{:.1} img/s", metrics.throughput()),
                    "Inference progress"
                );
            }

            start = end;
        }

        Ok(rows)
    }
}
