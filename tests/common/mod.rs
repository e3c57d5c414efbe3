//! Shared fixtures: a register directory with a small spam filter artifact

#![allow(dead_code)]

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use text_pipeliner::{EntryPayload, PickleRegister};

pub const SPAM_ID: &str = "spam0001";

/// Artifact for a two-class filter: "buy"/"now" -> class 1, "hello"/"friend" -> class 0
pub fn spam_artifact() -> Value {
    json!({
        "steps": [
            {
                "name": "vect",
                "stage": {
                    "kind": "count_vectorizer",
                    "vocabulary": {"buy": 0, "now": 1, "hello": 2, "friend": 3}
                }
            },
            {
                "name": "tfidf",
                "stage": {"kind": "tfidf_transformer", "idf": [1.0, 1.0, 1.0, 1.0]}
            },
            {
                "name": "clf",
                "stage": {
                    "kind": "linear_classifier",
                    "coef": [[1.0, 1.0, -1.0, -1.0]],
                    "intercept": [0.0],
                    "classes": [0, 1]
                }
            }
        ]
    })
}

pub fn spam_payload(name: &str) -> EntryPayload {
    serde_json::from_value(json!({
        "name": name,
        "answer_key": {"0": "ham", "1": "spam"},
        "components": ["CountVectorizer", "TfidfTransformer", "LinearClassifier"],
        "score": 0.91,
        "search_params": {"param_grid": {"clf__alpha": [0.00001, 0.000001]}},
        "description": "Flags messages that push you to buy now."
    }))
    .expect("fixture payload is valid")
}

/// Temp directory holding `register.json` and a `store/` directory
pub struct Workspace {
    pub dir: TempDir,
    pub register_path: PathBuf,
    pub store_dir: PathBuf,
}

impl Workspace {
    /// Empty register, empty store
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let register_path = dir.path().join("register.json");
        let store_dir = dir.path().join("store");
        std::fs::create_dir(&store_dir).expect("Failed to create store dir");

        PickleRegister::load(&register_path, &store_dir, true).expect("Failed to create register");

        Self {
            dir,
            register_path,
            store_dir,
        }
    }

    /// Register with the spam filter entry and its artifact
    pub fn with_spam_filter() -> Self {
        let workspace = Self::new();
        workspace.write_artifact(SPAM_ID, &spam_artifact());

        let mut register = workspace.open();
        register
            .new_entry_from_value(spam_payload(SPAM_ID), "pipeline", None)
            .expect("Failed to register fixture");

        workspace
    }

    pub fn open(&self) -> PickleRegister {
        PickleRegister::load(&self.register_path, &self.store_dir, false)
            .expect("Failed to open register")
    }

    pub fn write_artifact(&self, id: &str, artifact: &Value) {
        std::fs::write(self.store_dir.join(id), artifact.to_string())
            .expect("Failed to write artifact");
    }

    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, value.to_string()).expect("Failed to write json");
        path
    }

    pub fn register_on_disk(&self) -> Value {
        read_json(&self.register_path)
    }
}

pub fn read_json(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).expect("Failed to read file");
    serde_json::from_str(&content).expect("Failed to parse file")
}
