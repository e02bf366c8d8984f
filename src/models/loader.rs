//! ONNX checkpoint loader

use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Checkpoint filenames for the known model variants.
///
/// Consulted only after the requested name is parsed; nothing but the
/// requested variant is ever constructed.
const MODEL_CHECKPOINTS: &[(&str, &str)] = &[
    ("resnet50", "resnet50.onnx"),
    ("densenet161", "densenet161.onnx"),
    ("ayangnet", "ayangnet.onnx"),
];

/// Resolve a model name to its checkpoint filename
pub fn checkpoint_for(name: &str) -> Option<&'static str> {
    MODEL_CHECKPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, filename)| *filename)
}

/// Names accepted by [`ModelLoader::load_named`]
pub fn known_models() -> Vec<&'static str> {
    MODEL_CHECKPOINTS.iter().map(|(name, _)| *name).collect()
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for the raw score matrix
    pub output_name: String,
    /// Training epoch the checkpoint was taken at (0 when unrecorded)
    pub epoch: u64,
}

/// Loader for ONNX checkpoints
pub struct ModelLoader {
    /// Number of intra-op threads for ONNX inference
    intra_threads: usize,
}

impl ModelLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new loader with the specified number of intra-op threads
    pub fn with_threads(intra_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(intra_threads, "ONNX Runtime initialized");
        Ok(Self { intra_threads })
    }

    /// Load a checkpoint from an explicit path.
    ///
    /// A missing path is fatal and reported before any inference runs.
    pub fn load_checkpoint<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("no checkpoint found at \"{}\"", path.display());
        }

        info!(
            model = %name,
            path = %path.display(),
            threads = self.intra_threads,
            "Loading checkpoint"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load checkpoint from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| {
                o.name.contains("logit") || o.name.contains("score") || o.name.contains("output")
            })
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "output".to_string())
            });

        // Torch-style snapshots carry an epoch next to the weights; ONNX
        // checkpoints record it as custom metadata when exported.
        let epoch = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("epoch").ok().flatten())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            epoch,
            "Checkpoint loaded"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            output_name,
            epoch,
        })
    }

    /// Resolve a model name through the checkpoint table and load it
    pub fn load_named<P: AsRef<Path>>(&self, models_dir: P, name: &str) -> Result<LoadedModel> {
        let Some(filename) = checkpoint_for(name) else {
            bail!(
                "unknown model \"{}\" (known: {})",
                name,
                known_models().join(", ")
            );
        };
        self.load_checkpoint(models_dir.as_ref().join(filename), name)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { intra_threads: 1 }
    }
}
