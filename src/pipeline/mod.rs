//! Text classification pipelines
//!
//! Provides functionality for:
//! - Decoding pipeline artifacts from the store directory
//! - Running the vectorize -> weight -> classify stages on raw text
//! - Loading a set of artifacts into an id-keyed model map

pub mod loader;
pub mod stages;
pub mod text_pipeline;

use std::path::PathBuf;
use thiserror::Error;

pub use loader::{ModelLoader, ModelMap};
pub use stages::{CountVectorizer, LinearClassifier, Norm, SparseVector, Stage, TfidfTransformer};
pub use text_pipeline::{Step, TextPipeline};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid pipeline: {0}")]
    Invalid(String),

    #[error("Stage '{stage}' expects {expected} features, got {actual}")]
    Shape {
        stage: String,
        expected: usize,
        actual: usize,
    },
}

/// Anything that turns raw documents into class indices
pub trait Predictor: Send + Sync {
    /// Predict one class index per input document
    fn predict(&self, inputs: &[&str]) -> Result<Vec<i64>, PipelineError>;
}
