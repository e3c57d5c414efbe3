//! Pipeline stages: token counting, tf-idf weighting and linear classification

use super::PipelineError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Words of two or more word characters
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Feature index -> value, only non-zero features are stored
pub type SparseVector = BTreeMap<usize, f64>;

/// A single pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stage {
    CountVectorizer(CountVectorizer),
    TfidfTransformer(TfidfTransformer),
    LinearClassifier(LinearClassifier),
}

impl Stage {
    /// Component name as it appears in registry entries
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::CountVectorizer(_) => "CountVectorizer",
            Self::TfidfTransformer(_) => "TfidfTransformer",
            Self::LinearClassifier(_) => "LinearClassifier",
        }
    }
}

/// Bag-of-words counter over a fixed vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    /// Term -> feature index, indices are dense in `0..vocabulary.len()`
    pub vocabulary: HashMap<String, usize>,

    #[serde(default = "default_lowercase")]
    pub lowercase: bool,

    /// Inclusive (min_n, max_n) word n-gram range
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Record presence (1.0) instead of counts
    #[serde(default)]
    pub binary: bool,
}

impl CountVectorizer {
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(PipelineError::Invalid(format!(
                "ngram_range ({}, {}) is not a valid range",
                min_n, max_n
            )));
        }

        let n = self.n_features();
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, index)| **index >= n) {
            return Err(PipelineError::Invalid(format!(
                "vocabulary term '{}' has index {} outside 0..{}",
                term, index, n
            )));
        }

        Ok(())
    }

    /// Split a document into the terms this vectorizer counts
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let doc = if self.lowercase {
            doc.to_lowercase()
        } else {
            doc.to_string()
        };

        let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(&doc).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n == 1 {
                terms.extend(tokens.iter().map(|t| t.to_string()));
                continue;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut counts = SparseVector::new();
        for term in self.analyze(doc) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        if self.binary {
            counts.values_mut().for_each(|v| *v = 1.0);
        }
        counts
    }
}

/// Vector normalization applied after tf-idf weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Inverse document frequency weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfTransformer {
    pub idf: Vec<f64>,

    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,

    /// Replace tf with 1 + ln(tf)
    #[serde(default)]
    pub sublinear_tf: bool,
}

impl TfidfTransformer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn transform(&self, mut x: SparseVector) -> Result<SparseVector, PipelineError> {
        for (&index, value) in x.iter_mut() {
            let idf = self.idf.get(index).ok_or_else(|| PipelineError::Shape {
                stage: "TfidfTransformer".to_string(),
                expected: self.idf.len(),
                actual: index + 1,
            })?;
            let tf = if self.sublinear_tf {
                1.0 + value.ln()
            } else {
                *value
            };
            *value = tf * idf;
        }

        let scale = match self.norm {
            Some(Norm::L1) => x.values().map(|v| v.abs()).sum::<f64>(),
            Some(Norm::L2) => x.values().map(|v| v * v).sum::<f64>().sqrt(),
            None => 1.0,
        };
        if scale > 0.0 {
            x.values_mut().for_each(|v| *v /= scale);
        }

        Ok(x)
    }
}

/// One-vs-rest linear model
///
/// Binary models carry a single coefficient row; a positive decision value
/// selects `classes[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    pub classes: Vec<i64>,
}

impl LinearClassifier {
    pub fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.classes.len() < 2 {
            return Err(PipelineError::Invalid(format!(
                "classifier needs at least 2 classes, got {}",
                self.classes.len()
            )));
        }

        let expected_rows = if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        };
        if self.coef.len() != expected_rows {
            return Err(PipelineError::Invalid(format!(
                "classifier with {} classes needs {} coefficient rows, got {}",
                self.classes.len(),
                expected_rows,
                self.coef.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(PipelineError::Invalid(format!(
                "classifier has {} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }

        let n = self.n_features();
        if let Some(row) = self.coef.iter().find(|row| row.len() != n) {
            return Err(PipelineError::Shape {
                stage: "LinearClassifier".to_string(),
                expected: n,
                actual: row.len(),
            });
        }

        Ok(())
    }

    /// Decision values, one per coefficient row
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f64>, PipelineError> {
        let n = self.n_features();
        if let Some((&index, _)) = x.iter().next_back()
            && index >= n
        {
            return Err(PipelineError::Shape {
                stage: "LinearClassifier".to_string(),
                expected: n,
                actual: index + 1,
            });
        }

        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| b + x.iter().map(|(&i, v)| row[i] * v).sum::<f64>())
            .collect())
    }

    pub fn predict(&self, x: &SparseVector) -> Result<i64, PipelineError> {
        let scores = self.decision_function(x)?;

        if let [score] = scores.as_slice() {
            let class = if *score > 0.0 { 1 } else { 0 };
            return Ok(self.classes[class]);
        }

        let mut best = 0;
        for (k, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = k;
            }
        }
        Ok(self.classes[best])
    }
}

fn default_lowercase() -> bool {
    true
}
fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}
fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}
