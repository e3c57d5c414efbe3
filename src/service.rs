//! Prediction service: the register and loaded models behind the API

use crate::config::ServiceConfig;
use crate::pipeline::{ModelMap, PipelineError};
use crate::registry::{PickleRegister, RegisterDocument, RegistryEntry, RegistryError};
use serde::Serialize;
use thiserror::Error;

/// Submitted text is cut to this many characters when echoed back
const SUBMISSION_PREVIEW_CHARS: usize = 100;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unknown id '{0}'")]
    NotFound(String),

    #[error("Inference failed for '{id}': {source}")]
    InferenceError {
        id: String,
        #[source]
        source: PipelineError,
    },

    #[error("Class index {class} of '{id}' has no answer key entry")]
    LabelNotFound { id: String, class: i64 },
}

/// A decoded prediction together with the entry that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub prediction: String,
    pub register: RegistryEntry,
}

/// Register listing: the whole document or a single entry
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterListing<'a> {
    Full(&'a RegisterDocument),
    Single { register: &'a RegistryEntry },
}

/// Result of a form submission
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: String,
    pub prediction: String,
    /// Submitted text, truncated for display
    pub text: String,
    pub description: String,
}

/// Register plus the predictors loaded from it
///
/// Built once at start-up; read-only afterwards.
pub struct PredictionService {
    register: PickleRegister,
    models: ModelMap,
}

impl PredictionService {
    pub fn new(register: PickleRegister, models: ModelMap) -> Self {
        Self { register, models }
    }

    /// Load the register and every artifact it names
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RegistryError> {
        let register = PickleRegister::load(
            &config.register_path,
            &config.store_dir,
            config.create_new_register,
        )?;
        let models = register.load_pickles(None)?;
        Ok(Self::new(register, models))
    }

    pub fn register(&self) -> &PickleRegister {
        &self.register
    }

    /// Ids with a loaded predictor, sorted
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Classify `text` with the pipeline registered as `id`
    pub fn predict(&self, id: &str, text: &str) -> Result<Prediction, ServiceError> {
        let (label, entry) = self.classify(id, text)?;
        Ok(Prediction {
            prediction: label.to_string(),
            register: entry.clone(),
        })
    }

    /// The whole register, or `{"register": entry}` when filtered by id
    pub fn register_listing(&self, id: Option<&str>) -> Result<RegisterListing<'_>, ServiceError> {
        match id {
            None => Ok(RegisterListing::Full(self.register.document())),
            Some(id) => {
                let entry = self
                    .register
                    .get(id)
                    .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
                Ok(RegisterListing::Single { register: entry })
            }
        }
    }

    /// Classify a submitted article and prepare it for display
    pub fn render_submission(&self, id: &str, text: &str) -> Result<Submission, ServiceError> {
        let (label, entry) = self.classify(id, text)?;
        Ok(Submission {
            id: id.to_string(),
            prediction: label.to_string(),
            text: preview(text),
            description: entry.payload.description.clone(),
        })
    }

    fn classify(&self, id: &str, text: &str) -> Result<(&str, &RegistryEntry), ServiceError> {
        if !self.register.contains(id) {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        let entry = self
            .register
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let Some(model) = self.models.get(id) else {
            tracing::warn!(id = %id, "Registered id has no loaded model");
            return Err(ServiceError::NotFound(id.to_string()));
        };

        let class = model
            .predict(&[text])
            .and_then(|out| {
                out.first().copied().ok_or_else(|| {
                    PipelineError::Invalid("predictor returned no output".to_string())
                })
            })
            .map_err(|source| {
                crate::metrics::record_prediction_failure(id, "inference");
                ServiceError::InferenceError {
                    id: id.to_string(),
                    source,
                }
            })?;

        let label = entry.payload.label(class).ok_or_else(|| {
            crate::metrics::record_prediction_failure(id, "label_not_found");
            tracing::error!(id = %id, class = class, "Predicted class missing from answer key");
            ServiceError::LabelNotFound {
                id: id.to_string(),
                class,
            }
        })?;

        crate::metrics::record_prediction(id, label);
        tracing::debug!(id = %id, class = class, label = %label, "Prediction served");

        Ok((label, entry))
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(SUBMISSION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
