//! API request and response models

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Number of loaded models
    pub models: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for the register listing
#[derive(Debug, Default, Deserialize)]
pub struct RegisterQuery {
    pub id: Option<String>,
}

/// Request to classify a text
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub id: String,
    pub text: String,
}

/// Do-it-yourself form fields
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionForm {
    /// Selected model id
    pub pickles: String,
    pub article_text: String,
}

/// Models available to the form
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub pickles: Vec<String>,
}
