//! Test-Time-Augmentation Inference Pipeline
//!
//! Averages per-image class scores across repeated stochastic augmentation
//! passes of a pretrained classifier and writes a submission file.

pub mod augment;
pub mod categories;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod models;
pub mod output;

pub use augment::{Augment, AugmentPipeline};
pub use categories::CategoryMap;
pub use config::AppConfig;
pub use dataset::ImageStore;
pub use metrics::InferenceMetrics;
pub use models::averager::TtaAverager;
pub use models::classifier::{Classifier, OnnxClassifier};
pub use models::loader::ModelLoader;
pub use output::SubmissionWriter;
