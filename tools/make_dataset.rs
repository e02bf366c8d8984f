//! Synthetic Dataset Generator
//!
//! Writes a packed image file and a matching categories file so the pipeline
//! can be exercised without the real test split.

use anyhow::{Context, Result};
use rand::Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("make_dataset=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let images_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("data/test_images.bin");
    let categories_path = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("data/categories.txt");
    let count: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(64);
    let side: u32 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(256);
    let classes: usize = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        images_path = %images_path,
        categories_path = %categories_path,
        count,
        side,
        classes,
        "Generating synthetic dataset"
    );

    let mut rng = rand::thread_rng();

    if let Some(parent) = Path::new(images_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let frame = (side as usize) * (side as usize) * 3;
    let mut out = BufWriter::new(
        File::create(images_path).context(format!("failed to create {}", images_path))?,
    );
    for index in 0..count {
        let pixels: Vec<u8> = (0..frame).map(|_| rng.gen()).collect();
        out.write_all(&pixels)?;
        if (index + 1) % 100 == 0 {
            info!("Wrote {}/{} images", index + 1, count);
        }
    }
    out.flush()?;

    if let Some(parent) = Path::new(categories_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut categories = BufWriter::new(
        File::create(categories_path).context(format!("failed to create {}", categories_path))?,
    );
    for index in 0..classes {
        writeln!(categories, "/s/synthetic_{:03} {}", index, index)?;
    }
    categories.flush()?;

    info!(
        images = count,
        categories = classes,
        "Synthetic dataset written"
    );

    Ok(())
}
