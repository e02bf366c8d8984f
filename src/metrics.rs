//! Run statistics for the inference pipeline

use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the sequential inference run
pub struct InferenceMetrics {
    /// Total images finalized
    images_processed: u64,
    /// Total batches finalized
    batches_processed: u64,
    /// Total augmented forward passes run
    passes_run: u64,
    /// Per-batch wall times (in microseconds)
    batch_times_us: Vec<u64>,
    /// Start time for throughput calculation
    start_time: Instant,
}

impl InferenceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            images_processed: 0,
            batches_processed: 0,
            passes_run: 0,
            batch_times_us: Vec::with_capacity(1000),
            start_time: Instant::now(),
        }
    }

    /// Record one augmented forward pass
    pub fn record_pass(&mut self) {
        self.passes_run += 1;
    }

    /// Record a finalized batch
    pub fn record_batch(&mut self, wall_time: Duration, images: usize) {
        self.batches_processed += 1;
        self.images_processed += images as u64;
        self.batch_times_us.push(wall_time.as_micros() as u64);
    }

    pub fn images_processed(&self) -> u64 {
        self.images_processed
    }

    pub fn batches_processed(&self) -> u64 {
        self.batches_processed
    }

    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    /// Current throughput (images per second)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.images_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Batch wall-time statistics
    pub fn batch_stats(&self) -> BatchStats {
        if self.batch_times_us.is_empty() {
            return BatchStats::default();
        }

        let mut sorted = self.batch_times_us.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        BatchStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let stats = self.batch_stats();
        info!(
            images = self.images_processed,
            batches = self.batches_processed,
            passes = self.passes_run,
            throughput = format!("{:.1} img/s", self.throughput()),
            "Inference run complete"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Batch wall time"
        );
    }
}

impl Default for InferenceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch wall-time statistics
#[derive(Debug, Default)]
pub struct BatchStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
