//! Configuration management for the inference pipeline

use anyhow::{bail, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub augment: AugmentConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model selection and checkpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model name to run (resolved through the checkpoint table)
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Directory containing checkpoint files
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
    /// Explicit checkpoint path, bypassing the models_dir lookup
    #[serde(default)]
    pub checkpoint: Option<String>,
    /// Number of intra-op threads for ONNX inference (default: 1)
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_model_name() -> String {
    "resnet50".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_intra_threads() -> usize {
    1
}

/// Test-split dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Packed RGB8 image file, one H x W x 3 frame per image
    pub images: String,
    /// Frame width in pixels
    #[serde(default = "default_image_side")]
    pub width: u32,
    /// Frame height in pixels
    #[serde(default = "default_image_side")]
    pub height: u32,
    /// Category map text file
    #[serde(default = "default_categories")]
    pub categories: String,
}

fn default_image_side() -> u32 {
    256
}

fn default_categories() -> String {
    "data/categories.txt".to_string()
}

/// Augmentation pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Side length images are resized to before cropping
    pub resize: u32,
    /// Side length of the random crop fed to the model
    pub crop: u32,
    /// Probability of a horizontal flip per pass
    pub flip_prob: f64,
    /// Brightness jitter strength (factor drawn from [1-b, 1+b])
    pub brightness: f32,
    /// Saturation jitter strength (factor drawn from [1-s, 1+s])
    pub saturation: f32,
    /// Fixed RNG seed for reproducible augmentation draws
    pub seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            resize: 256,
            crop: 224,
            flip_prob: 0.5,
            brightness: 0.1,
            saturation: 0.3,
            seed: None,
        }
    }
}

/// Averaging loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of images per batch
    pub batch_size: usize,
    /// Number of augmented passes averaged per batch
    pub repeats: usize,
    /// Progress log cadence in batches (0 disables)
    pub progress_every: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            repeats: 11,
            progress_every: 25,
        }
    }
}

/// Submission output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the whitespace-delimited score file
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    "predictions/submit.txt".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject degenerate values before any component is constructed
    pub fn validate(&self) -> Result<()> {
        if self.inference.batch_size == 0 {
            bail!("inference.batch_size must be positive");
        }
        if self.inference.repeats == 0 {
            bail!("inference.repeats must be positive");
        }
        if self.augment.crop == 0 || self.augment.crop > self.augment.resize {
            bail!(
                "augment.crop must be between 1 and augment.resize ({})",
                self.augment.resize
            );
        }
        if !(0.0..=1.0).contains(&self.augment.flip_prob) {
            bail!("augment.flip_prob must be within [0, 1]");
        }
        if self.dataset.width == 0 || self.dataset.height == 0 {
            bail!("dataset.width and dataset.height must be positive");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                name: default_model_name(),
                models_dir: default_models_dir(),
                checkpoint: None,
                intra_threads: 1,
            },
            dataset: DatasetConfig {
                images: "data/test_images.bin".to_string(),
                width: 256,
                height: 256,
                categories: default_categories(),
            },
            augment: AugmentConfig::default(),
            inference: InferenceConfig::default(),
            output: OutputConfig {
                path: default_output_path(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.name, "resnet50");
        assert_eq!(config.inference.batch_size, 16);
        assert_eq!(config.inference.repeats, 11);
        assert_eq!(config.inference.progress_every, 25);
        assert_eq!(config.augment.crop, 224);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = AppConfig::default();
        config.inference.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_repeats() {
        let mut config = AppConfig::default();
        config.inference.repeats = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_crop() {
        let mut config = AppConfig::default();
        config.augment.crop = config.augment.resize + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_flip_prob() {
        let mut config = AppConfig::default();
        config.augment.flip_prob = 1.5;
        assert!(config.validate().is_err());
    }
}
