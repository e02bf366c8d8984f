//! Stochastic augmentation ahead of inference

use crate::config::AugmentConfig;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-channel normalization constants shared with the training pipeline.
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocessing capability: a raw image in, a normalized CHW tensor out.
///
/// Implementations may be stochastic; the output geometry must depend only on
/// configuration, never on the draw.
pub trait Augment {
    fn transform(&mut self, image: &RgbImage) -> Array3<f32>;
}

/// Randomized crop / flip / color-jitter pipeline producing normalized
/// 3 x crop x crop tensors.
pub struct AugmentPipeline {
    resize: u32,
    crop: u32,
    flip_prob: f64,
    brightness: f32,
    saturation: f32,
    rng: StdRng,
}

impl AugmentPipeline {
    /// Build the pipeline from configuration
    pub fn new(config: &AugmentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            resize: config.resize,
            crop: config.crop,
            flip_prob: config.flip_prob,
            brightness: config.brightness,
            saturation: config.saturation,
            rng,
        }
    }

    /// Side length of the produced tensors
    pub fn output_side(&self) -> u32 {
        self.crop
    }
}

impl Augment for AugmentPipeline {
    fn transform(&mut self, image: &RgbImage) -> Array3<f32> {
        let resized = if image.width() != self.resize || image.height() != self.resize {
            imageops::resize(image, self.resize, self.resize, FilterType::Triangle)
        } else {
            image.clone()
        };

        let max_offset = self.resize - self.crop;
        let (x, y) = if max_offset > 0 {
            (
                self.rng.gen_range(0..=max_offset),
                self.rng.gen_range(0..=max_offset),
            )
        } else {
            (0, 0)
        };
        let mut cropped = imageops::crop_imm(&resized, x, y, self.crop, self.crop).to_image();

        if self.flip_prob > 0.0 && self.rng.gen_bool(self.flip_prob) {
            cropped = imageops::flip_horizontal(&cropped);
        }

        let brightness = if self.brightness > 0.0 {
            self.rng
                .gen_range(1.0 - self.brightness..=1.0 + self.brightness)
        } else {
            1.0
        };
        let saturation = if self.saturation > 0.0 {
            self.rng
                .gen_range(1.0 - self.saturation..=1.0 + self.saturation)
        } else {
            1.0
        };

        let side = self.crop as usize;
        let mut out = Array3::<f32>::zeros((3, side, side));
        for (px, py, pixel) in cropped.enumerate_pixels() {
            let rgb = pixel.0.map(|v| v as f32 / 255.0);
            let luma = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
            for channel in 0..3 {
                let jittered =
                    ((luma + (rgb[channel] - luma) * saturation) * brightness).clamp(0.0, 1.0);
                out[[channel, py as usize, px as usize]] =
                    (jittered - CHANNEL_MEAN[channel]) / CHANNEL_STD[channel];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> AugmentConfig {
        AugmentConfig {
            resize: 8,
            crop: 4,
            flip_prob: 0.5,
            brightness: 0.1,
            saturation: 0.3,
            seed: Some(seed),
        }
    }

    fn gradient_image(side: u32) -> RgbImage {
        RgbImage::from_fn(side, side, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        })
    }

    #[test]
    fn test_output_geometry_is_fixed() {
        let mut pipeline = AugmentPipeline::new(&config(1));
        for _ in 0..5 {
            let tensor = pipeline.transform(&gradient_image(8));
            assert_eq!(tensor.dim(), (3, 4, 4));
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let image = gradient_image(8);
        let mut a = AugmentPipeline::new(&config(7));
        let mut b = AugmentPipeline::new(&config(7));
        for _ in 0..3 {
            assert_eq!(a.transform(&image), b.transform(&image));
        }
    }

    #[test]
    fn test_disabled_jitter_normalizes_exactly() {
        let config = AugmentConfig {
            resize: 4,
            crop: 4,
            flip_prob: 0.0,
            brightness: 0.0,
            saturation: 0.0,
            seed: Some(0),
        };
        let mut pipeline = AugmentPipeline::new(&config);
        let image = RgbImage::from_pixel(4, 4, image::Rgb([128, 128, 128]));
        let tensor = pipeline.transform(&image);

        let v = 128.0 / 255.0;
        for channel in 0..3 {
            let expected = (v - CHANNEL_MEAN[channel]) / CHANNEL_STD[channel];
            assert!((tensor[[channel, 0, 0]] - expected).abs() < 1e-6);
            assert!((tensor[[channel, 3, 3]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_undersized_input_is_resized() {
        let mut pipeline = AugmentPipeline::new(&config(3));
        let tensor = pipeline.transform(&gradient_image(5));
        assert_eq!(tensor.dim(), (3, 4, 4));
    }
}
