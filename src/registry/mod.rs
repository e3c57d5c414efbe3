//! Pickle register: durable catalog of the available pipelines
//!
//! The register is a single JSON document with a top-level `register`
//! mapping from id to entry. An in-memory index groups ids by pickletype.

pub mod entry;
pub mod index;
pub mod storage;
pub mod store;

use crate::pipeline::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

pub use entry::{EntryPayload, RegisterDocument, RegistryEntry};
pub use index::RegistryIndex;
pub use storage::{FileSystemStorage, StorageBackend};
pub use store::{PickleRegister, parse_id_subset};

/// Register errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid register file {path:?}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("'{0}' is already registered, did you mean to update it?")]
    DuplicateId(String),

    #[error("Couldn't find the ID '{0}' in the register")]
    NotFound(String),

    #[error("Invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("id subset isn't an iterable of ids: {0}")]
    NotIterable(String),

    #[error("Failed to load artifact '{id}': {source}")]
    Artifact {
        id: String,
        #[source]
        source: PipelineError,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
