//! Test-Time-Augmentation Inference - Main Entry Point
//!
//! Loads a pretrained classifier checkpoint, averages repeated augmented
//! inference passes over the fixed test split, and writes a submission file.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tta_pipeline::{
    augment::AugmentPipeline,
    categories::CategoryMap,
    config::AppConfig,
    dataset::ImageStore,
    metrics::InferenceMetrics,
    models::{averager::TtaAverager, classifier::OnnxClassifier, loader::ModelLoader},
    output::SubmissionWriter,
};

#[derive(Parser, Debug)]
#[command(about = "Averaged test-time-augmentation inference over a fixed image dataset")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "config/config.toml")]
    config: String,

    /// Checkpoint path, bypassing the models-directory lookup
    #[arg(long)]
    checkpoint: Option<String>,

    /// Model name to run
    #[arg(long)]
    model: Option<String>,

    /// Submission file path
    #[arg(long)]
    output: Option<String>,

    /// Augmented passes averaged per batch
    #[arg(long)]
    repeats: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and apply command-line overrides
    let mut config = AppConfig::load_from_path(&args.config)?;
    if let Some(checkpoint) = args.checkpoint {
        config.model.checkpoint = Some(checkpoint);
    }
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }
    if let Some(repeats) = args.repeats {
        config.inference.repeats = repeats;
    }
    config.validate()?;

    // Initialize logging at the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tta_pipeline={}", config.logging.level).parse()?),
        )
        .init();

    info!("Starting TTA inference pipeline");
    info!(
        model = %config.model.name,
        batch_size = config.inference.batch_size,
        repeats = config.inference.repeats,
        output = %config.output.path,
        "Configuration loaded"
    );

    // Class-label map; its size fixes the expected score width
    let categories = CategoryMap::load(&config.dataset.categories)?;

    // Construct only the requested model variant
    let loader = ModelLoader::with_threads(config.model.intra_threads)?;
    let model = match &config.model.checkpoint {
        Some(path) => loader.load_checkpoint(path, &config.model.name)?,
        None => loader.load_named(&config.model.models_dir, &config.model.name)?,
    };
    info!(model = %model.name, epoch = model.epoch, "Model ready");

    let store = ImageStore::open(
        &config.dataset.images,
        config.dataset.width,
        config.dataset.height,
    )?;

    let mut classifier = OnnxClassifier::new(model, categories.len());
    let mut augment = AugmentPipeline::new(&config.augment);
    let mut metrics = InferenceMetrics::new();

    let averager = TtaAverager::new(
        config.inference.batch_size,
        config.inference.repeats,
        config.inference.progress_every,
    )?;
    let rows = averager.run(
        &store,
        &mut classifier,
        &mut augment,
        categories.len(),
        &mut metrics,
    )?;

    SubmissionWriter::new(&config.output.path).write(&rows)?;
    metrics.print_summary();

    Ok(())
}
