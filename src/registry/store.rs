//! File-backed pickle register

use super::storage::{FileSystemStorage, StorageBackend};
use super::{EntryPayload, RegisterDocument, RegistryEntry, RegistryError, RegistryIndex};
use crate::pipeline::{ModelLoader, ModelMap};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Register of pipelines, persisted as one JSON document
///
/// Every mutation rewrites the whole document. There is no locking, so
/// mutations from more than one process at a time are unsupported.
pub struct PickleRegister {
    path: PathBuf,
    loader: ModelLoader,
    document: RegisterDocument,
    index: RegistryIndex,
    storage: Arc<dyn StorageBackend>,
}

impl PickleRegister {
    /// Load the register at `path`, with artifacts under `storepath`
    ///
    /// With `create_new`, an empty register is written to `path` first.
    pub fn load(
        path: impl Into<PathBuf>,
        storepath: impl Into<PathBuf>,
        create_new: bool,
    ) -> Result<Self, RegistryError> {
        Self::load_with_storage(path, storepath, create_new, Arc::new(FileSystemStorage::new()))
    }

    /// Load the register through a custom storage backend
    pub fn load_with_storage(
        path: impl Into<PathBuf>,
        storepath: impl Into<PathBuf>,
        create_new: bool,
        storage: Arc<dyn StorageBackend>,
    ) -> Result<Self, RegistryError> {
        let path = path.into();

        if create_new {
            let empty = serde_json::to_string(&RegisterDocument::default())?;
            storage.save(&path, &empty).map_err(|source| RegistryError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = ?path, "Created empty register");
        }

        let content = storage.load(&path).map_err(|source| RegistryError::Io {
            path: path.clone(),
            source,
        })?;
        let document = parse_document(&path, &content)?;
        let index = RegistryIndex::rebuild(document.register.values());

        tracing::info!(
            path = ?path,
            entries = index.len(),
            pickletypes = index.pickletypes().count(),
            "Register loaded"
        );

        Ok(Self {
            path,
            loader: ModelLoader::new(storepath),
            document,
            index,
            storage,
        })
    }

    /// Register a payload read from a JSON file
    pub fn new_entry_from_path(
        &mut self,
        payload_path: &Path,
        pickletype: &str,
        id: Option<&str>,
    ) -> Result<&RegistryEntry, RegistryError> {
        let payload = read_json(payload_path)?;
        self.new_entry_from_value(payload, pickletype, id)
    }

    /// Register a payload
    ///
    /// The id defaults to the payload's `name`.
    pub fn new_entry_from_value(
        &mut self,
        payload: EntryPayload,
        pickletype: &str,
        id: Option<&str>,
    ) -> Result<&RegistryEntry, RegistryError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => payload.name.clone(),
        };
        validate_id(&id)?;

        if self.index.contains(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        let entry = RegistryEntry {
            id: id.clone(),
            pickletype: pickletype.to_string(),
            payload,
        };
        self.document.register.insert(id.clone(), entry);
        self.index.insert(&id, pickletype);

        if let Err(e) = self.persist() {
            self.document.register.remove(&id);
            self.index.remove(&id);
            return Err(e);
        }

        tracing::info!(id = %id, pickletype = %pickletype, "Entry registered");

        Ok(&self.document.register[&id])
    }

    /// Replace an entry with the one read from a JSON file
    pub fn update_entry_from_path(&mut self, entry_path: &Path) -> Result<(), RegistryError> {
        let entry = read_json(entry_path)?;
        self.update_entry_from_value(entry)
    }

    /// Replace an existing entry wholesale
    ///
    /// A changed pickletype moves the id to its new bucket.
    pub fn update_entry_from_value(&mut self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let id = entry.id.clone();
        let Some(previous) = self.document.register.get(&id).cloned() else {
            return Err(RegistryError::NotFound(id));
        };

        let pickletype = entry.pickletype.clone();
        self.document.register.insert(id.clone(), entry);
        if previous.pickletype != pickletype {
            self.index.retype(&id, &pickletype);
        }

        if let Err(e) = self.persist() {
            self.index.retype(&id, &previous.pickletype);
            self.document.register.insert(id, previous);
            return Err(e);
        }

        if previous.pickletype != pickletype {
            tracing::info!(
                id = %id,
                from = %previous.pickletype,
                to = %pickletype,
                "Entry updated with new pickletype"
            );
        } else {
            tracing::info!(id = %id, "Entry updated");
        }

        Ok(())
    }

    /// Remove an entry
    ///
    /// Unknown ids are ignored unless `raise_on_missing` is set. The document
    /// is rewritten either way, except when an error is returned.
    pub fn delete_entry(&mut self, id: &str, raise_on_missing: bool) -> Result<(), RegistryError> {
        let removed = self.document.register.remove(id);
        if removed.is_none() && raise_on_missing {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        self.index.remove(id);

        if let Err(e) = self.persist() {
            if let Some(entry) = removed {
                self.index.insert(&entry.id, &entry.pickletype);
                self.document.register.insert(entry.id.clone(), entry);
            }
            return Err(e);
        }

        match removed {
            Some(entry) => {
                tracing::info!(id = %id, pickletype = %entry.pickletype, "Entry deleted")
            }
            None => tracing::debug!(id = %id, "Delete of unknown id ignored"),
        }

        Ok(())
    }

    /// Load artifacts for every registered id, or only for `id_subset`
    ///
    /// An empty subset loads every registered id. Fails on the first invalid
    /// id, or missing or corrupt artifact.
    pub fn load_pickles(&self, id_subset: Option<&[String]>) -> Result<ModelMap, RegistryError> {
        let ids: Vec<&str> = match id_subset {
            Some(subset) if !subset.is_empty() => subset.iter().map(String::as_str).collect(),
            _ => self.index.all_ids().iter().map(String::as_str).collect(),
        };

        let mut models = ModelMap::with_capacity(ids.len());
        for id in ids {
            validate_id(id)?;
            let predictor = self.loader.load(id).map_err(|source| {
                tracing::error!(id = %id, error = %source, "Failed to load artifact");
                RegistryError::Artifact {
                    id: id.to_string(),
                    source,
                }
            })?;
            models.insert(id.to_string(), predictor);
        }

        tracing::info!(
            models = models.len(),
            storepath = ?self.loader.storepath(),
            "Artifacts loaded"
        );

        Ok(models)
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.document.register.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        self.index.all_ids()
    }

    pub fn ids_by_type(&self, pickletype: &str) -> Option<&BTreeSet<String>> {
        self.index.ids_by_type(pickletype)
    }

    pub fn pickletypes(&self) -> impl Iterator<Item = &str> {
        self.index.pickletypes()
    }

    pub fn index(&self) -> &RegistryIndex {
        &self.index
    }

    pub fn document(&self) -> &RegisterDocument {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn storepath(&self) -> &Path {
        self.loader.storepath()
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    fn persist(&self) -> Result<(), RegistryError> {
        let content = serde_json::to_string_pretty(&self.document)?;
        self.storage
            .save(&self.path, &content)
            .map_err(|source| RegistryError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = ?self.path, entries = self.len(), "Register saved");

        Ok(())
    }
}

/// Turn an untyped value into a list of ids
///
/// Accepts an array of strings; anything else is `NotIterable`.
pub fn parse_id_subset(value: &Value) -> Result<Vec<String>, RegistryError> {
    let Value::Array(items) = value else {
        return Err(RegistryError::NotIterable(format!("got {}", value)));
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| RegistryError::NotIterable(format!("{} is not an id", item)))
        })
        .collect()
}

/// Ids name artifact files inside the store directory, so they must stay there
fn validate_id(id: &str) -> Result<(), RegistryError> {
    let reason = if id.is_empty() {
        "id cannot be empty (no id given and payload has no name)"
    } else if id.contains('/') || id.contains('\\') {
        "id cannot contain path separators"
    } else if id == "." || id == ".." {
        "id cannot be a relative directory"
    } else {
        return Ok(());
    };

    Err(RegistryError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    })
}

fn parse_document(path: &Path, content: &str) -> Result<RegisterDocument, RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidFormat {
        path: path.to_path_buf(),
        reason,
    };

    let value: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(invalid("top-level value is not an object".to_string()));
    };
    let register = match root.remove("register") {
        Some(Value::Object(register)) => register,
        Some(_) => return Err(invalid("'register' is not a mapping".to_string())),
        None => return Err(invalid("missing 'register' key".to_string())),
    };

    let mut document = RegisterDocument::default();
    for (key, raw) in register {
        validate_id(&key).map_err(|e| invalid(e.to_string()))?;
        let entry: RegistryEntry = serde_json::from_value(raw)
            .map_err(|e| invalid(format!("entry '{}': {}", key, e)))?;
        if entry.id != key {
            return Err(invalid(format!(
                "entry stored under '{}' has id '{}'",
                key, entry.id
            )));
        }
        document.register.insert(key, entry);
    }

    Ok(document)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
