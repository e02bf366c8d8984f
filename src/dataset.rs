//! Packed raw-image store for the fixed test split

use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::fs;
use std::path::Path;
use tracing::info;

/// Ordered, fixed-length store of raw RGB frames.
///
/// The backing file is a plain concatenation of H x W x 3 byte frames in
/// dataset order. The image count is derived from the file size.
pub struct ImageStore {
    data: Vec<u8>,
    width: u32,
    height: u32,
    count: usize,
}

impl ImageStore {
    /// Load a packed image file
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("failed to read image file {}", path.display()))?;
        let store = Self::from_raw(data, width, height)
            .with_context(|| format!("invalid image file {}", path.display()))?;
        info!(
            path = %path.display(),
            images = store.count,
            width,
            height,
            "Image store loaded"
        );
        Ok(store)
    }

    /// Build a store from an in-memory frame buffer
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let frame = (width as usize) * (height as usize) * 3;
        if frame == 0 {
            bail!("image dimensions must be non-zero");
        }
        if data.len() % frame != 0 {
            bail!(
                "data length {} is not a multiple of the {}x{}x3 frame size {}",
                data.len(),
                width,
                height,
                frame
            );
        }
        let count = data.len() / frame;
        Ok(Self {
            data,
            width,
            height,
            count,
        })
    }

    /// Number of images in the store
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copy the frame at `index` out as an owned image
    pub fn image(&self, index: usize) -> Result<RgbImage> {
        if index >= self.count {
            bail!("image index {} out of range ({} images)", index, self.count);
        }
        let frame = (self.width as usize) * (self.height as usize) * 3;
        let start = index * frame;
        let pixels = self.data[start..start + frame].to_vec();
        RgbImage::from_raw(self.width, self.height, pixels)
            .context("frame bytes do not match the configured dimensions")
    }
}
