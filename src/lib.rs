//! Text Pipeliner - prediction service for pre-trained text classifiers
//!
//! A small Rust service that serves predictions from registered text
//! classification pipelines. Registry metadata lives in a single JSON
//! document; pipeline artifacts live as individual files in a store directory.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod service;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use pipeline::{ModelLoader, ModelMap, PipelineError, Predictor, TextPipeline};
pub use registry::{
    EntryPayload, PickleRegister, RegisterDocument, RegistryEntry, RegistryError, RegistryIndex,
};
pub use service::{Prediction, PredictionService, ServiceError};
