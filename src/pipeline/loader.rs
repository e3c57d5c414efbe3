//! Artifact loader
//!
//! Artifacts are stored one per file in the store directory, named by their
//! registry id.

use super::{PipelineError, Predictor, TextPipeline};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry id -> loaded predictor
pub type ModelMap = HashMap<String, Arc<dyn Predictor>>;

/// Loads pipeline artifacts from a store directory
#[derive(Debug, Clone)]
pub struct ModelLoader {
    storepath: PathBuf,
}

impl ModelLoader {
    pub fn new(storepath: impl Into<PathBuf>) -> Self {
        Self {
            storepath: storepath.into(),
        }
    }

    pub fn storepath(&self) -> &Path {
        &self.storepath
    }

    /// Location of the artifact for `id`
    pub fn artifact_path(&self, id: &str) -> PathBuf {
        self.storepath.join(id)
    }

    /// Read and validate the pipeline stored under `id`
    pub fn load_pipeline(&self, id: &str) -> Result<TextPipeline, PipelineError> {
        let path = self.artifact_path(id);
        let content = std::fs::read_to_string(&path).map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;

        let pipeline = TextPipeline::from_json(&content)?;

        tracing::debug!(
            id = %id,
            path = ?path,
            steps = pipeline.steps.len(),
            "Pipeline artifact loaded"
        );

        Ok(pipeline)
    }

    pub fn load(&self, id: &str) -> Result<Arc<dyn Predictor>, PipelineError> {
        Ok(Arc::new(self.load_pipeline(id)?))
    }

    /// Write `pipeline` as the artifact for `id`
    #[cfg(test)]
    pub fn save_pipeline(&self, id: &str, pipeline: &TextPipeline) -> Result<PathBuf, PipelineError> {
        let path = self.artifact_path(id);
        let content = serde_json::to_string(pipeline)?;
        std::fs::write(&path, content).map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
