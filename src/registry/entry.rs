//! Register document and entry types

use crate::pipeline::TextPipeline;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The whole register as persisted on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterDocument {
    pub register: BTreeMap<String, RegistryEntry>,
}

/// One registered pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub pickletype: String,
    pub payload: EntryPayload,
}

/// Metadata describing a tuned pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    #[serde(default)]
    pub name: String,

    /// Class index (as a string) -> human readable label
    #[serde(default)]
    pub answer_key: BTreeMap<String, String>,

    /// Stage names in pipeline order
    #[serde(default)]
    pub components: Vec<String>,

    /// Best cross-validation score of the tuning run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub search_params: Value,

    #[serde(default)]
    pub description: String,

    /// Fields this service does not interpret, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntryPayload {
    /// Describe a fitted pipeline as a register payload
    ///
    /// `categories[i]` becomes the label for class index `i`.
    pub fn from_pipeline(
        name: impl Into<String>,
        pipeline: &TextPipeline,
        categories: &[String],
        score: Option<f64>,
        search_params: Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            answer_key: categories
                .iter()
                .enumerate()
                .map(|(i, label)| (i.to_string(), label.clone()))
                .collect(),
            components: pipeline.components(),
            score,
            search_params,
            description: description.into(),
            extra: Map::new(),
        }
    }

    /// Label for a predicted class index
    pub fn label(&self, class: i64) -> Option<&str> {
        self.answer_key.get(&class.to_string()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::text_pipeline::spam_filter;
    use serde_json::json;

    #[test]
    fn test_from_pipeline() {
        let payload = EntryPayload::from_pipeline(
            "spam0001",
            &spam_filter(),
            &["ham".to_string(), "spam".to_string()],
            Some(0.93),
            json!({"param_grid": {"clf__alpha": [0.00001]}}),
            "Spam filter",
        );

        assert_eq!(payload.name, "spam0001");
        assert_eq!(payload.label(0), Some("ham"));
        assert_eq!(payload.label(1), Some("spam"));
        assert_eq!(payload.label(2), None);
        assert_eq!(payload.components.len(), 3);
        assert_eq!(payload.score, Some(0.93));
    }

    #[test]
    fn test_payload_keeps_unknown_fields() {
        let raw = json!({
            "name": "p",
            "answer_key": {"0": "a"},
            "components": [],
            "score": 0.5,
            "search_params": {},
            "description": "d",
            "trained_on": "newsgroups"
        });

        let payload: EntryPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.extra["trained_on"], "newsgroups");
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_absent_optional_fields_stay_absent() {
        let raw = json!({
            "name": "bare",
            "answer_key": {"0": "a"},
            "components": [],
            "description": ""
        });

        let payload: EntryPayload = serde_json::from_value(raw.clone()).unwrap();
        let written = serde_json::to_value(&payload).unwrap();
        assert!(written.get("score").is_none());
        assert!(written.get("search_params").is_none());
        assert_eq!(written, raw);
    }

    #[test]
    fn test_payload_defaults() {
        let payload: EntryPayload = serde_json::from_value(json!({"name": "bare"})).unwrap();
        assert!(payload.answer_key.is_empty());
        assert_eq!(payload.score, None);
        assert_eq!(payload.search_params, Value::Null);
    }
}
