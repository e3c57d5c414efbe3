//! Ordered, named pipeline stages ending in a classifier

use super::stages::{SparseVector, Stage};
use super::{PipelineError, Predictor};
use serde::{Deserialize, Serialize};

/// A named pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub stage: Stage,
}

/// A fitted text classification pipeline as stored in an artifact file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPipeline {
    pub steps: Vec<Step>,
}

impl TextPipeline {
    /// Decode and validate an artifact
    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        let pipeline: Self = serde_json::from_str(content)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check stage order and that feature dimensions agree between stages
    pub fn validate(&self) -> Result<(), PipelineError> {
        let Some((last, rest)) = self.steps.split_last() else {
            return Err(PipelineError::Invalid("pipeline has no steps".to_string()));
        };
        let Stage::LinearClassifier(clf) = &last.stage else {
            return Err(PipelineError::Invalid(format!(
                "last step '{}' must be a classifier",
                last.name
            )));
        };

        let mut features: Option<usize> = None;
        for step in rest {
            match &step.stage {
                Stage::CountVectorizer(v) => {
                    if features.is_some() {
                        return Err(PipelineError::Invalid(format!(
                            "step '{}' vectorizes an already vectorized input",
                            step.name
                        )));
                    }
                    v.validate()?;
                    features = Some(v.n_features());
                }
                Stage::TfidfTransformer(t) => {
                    let actual = features.ok_or_else(|| {
                        PipelineError::Invalid(format!(
                            "step '{}' needs a vectorizer before it",
                            step.name
                        ))
                    })?;
                    check_features(&step.name, t.n_features(), actual)?;
                }
                Stage::LinearClassifier(_) => {
                    return Err(PipelineError::Invalid(format!(
                        "classifier step '{}' must be the last step",
                        step.name
                    )));
                }
            }
        }

        clf.validate()?;
        let actual = features.ok_or_else(|| {
            PipelineError::Invalid("pipeline has no vectorizer".to_string())
        })?;
        check_features(&last.name, clf.n_features(), actual)
    }

    /// Stage kind names in pipeline order
    pub fn components(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| s.stage.kind_name().to_string())
            .collect()
    }

    /// Class indices the final classifier can emit
    pub fn classes(&self) -> &[i64] {
        match self.steps.last().map(|s| &s.stage) {
            Some(Stage::LinearClassifier(clf)) => &clf.classes,
            _ => &[],
        }
    }

    pub fn predict_one(&self, doc: &str) -> Result<i64, PipelineError> {
        let mut features: Option<SparseVector> = None;

        for step in &self.steps {
            match &step.stage {
                Stage::CountVectorizer(v) => features = Some(v.transform(doc)),
                Stage::TfidfTransformer(t) => {
                    let x = features.take().ok_or_else(|| {
                        PipelineError::Invalid(format!("step '{}' has no input", step.name))
                    })?;
                    features = Some(t.transform(x)?);
                }
                Stage::LinearClassifier(clf) => {
                    let x = features.take().ok_or_else(|| {
                        PipelineError::Invalid(format!("step '{}' has no input", step.name))
                    })?;
                    return clf.predict(&x);
                }
            }
        }

        Err(PipelineError::Invalid(
            "pipeline has no classifier".to_string(),
        ))
    }
}

impl Predictor for TextPipeline {
    fn predict(&self, inputs: &[&str]) -> Result<Vec<i64>, PipelineError> {
        inputs.iter().map(|doc| self.predict_one(doc)).collect()
    }
}

fn check_features(stage: &str, expected: usize, actual: usize) -> Result<(), PipelineError> {
    if expected != actual {
        return Err(PipelineError::Shape {
            stage: stage.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Two-class spam filter: class 1 ("spam") for "buy"/"now", class 0 otherwise
#[cfg(test)]
pub(crate) fn spam_filter() -> TextPipeline {
    use super::stages::{CountVectorizer, LinearClassifier, Norm, TfidfTransformer};

    let vocabulary = ["buy", "now", "hello", "friend"]
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i))
        .collect();

    TextPipeline {
        steps: vec![
            Step {
                name: "vect".to_string(),
                stage: Stage::CountVectorizer(CountVectorizer {
                    vocabulary,
                    lowercase: true,
                    ngram_range: (1, 1),
                    binary: false,
                }),
            },
            Step {
                name: "tfidf".to_string(),
                stage: Stage::TfidfTransformer(TfidfTransformer {
                    idf: vec![1.0; 4],
                    norm: Some(Norm::L2),
                    sublinear_tf: false,
                }),
            },
            Step {
                name: "clf".to_string(),
                stage: Stage::LinearClassifier(LinearClassifier {
                    coef: vec![vec![1.0, 1.0, -1.0, -1.0]],
                    intercept: vec![0.0],
                    classes: vec![0, 1],
                }),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spam_filter_predictions() {
        let pipeline = spam_filter();
        pipeline.validate().unwrap();

        let out = pipeline
            .predict(&["buy now", "hello friend", "", "BUY NOW friend"])
            .unwrap();
        assert_eq!(out, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_components_follow_step_order() {
        assert_eq!(
            spam_filter().components(),
            vec!["CountVectorizer", "TfidfTransformer", "LinearClassifier"]
        );
        assert_eq!(spam_filter().classes(), &[0, 1]);
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let json = serde_json::to_string(&spam_filter()).unwrap();
        let decoded = TextPipeline::from_json(&json).unwrap();
        assert_eq!(decoded, spam_filter());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let pipeline = TextPipeline { steps: vec![] };
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::Invalid(_))
        ));
    }

    #[test]
    fn test_classifier_must_be_last() {
        let mut pipeline = spam_filter();
        pipeline.steps.swap(1, 2);
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_feature_mismatch_rejected() {
        let mut pipeline = spam_filter();
        if let Stage::TfidfTransformer(t) = &mut pipeline.steps[1].stage {
            t.idf.pop();
        }
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::Shape { expected: 3, actual: 4, .. })
        ));
    }

    #[test]
    fn test_garbage_artifact_rejected() {
        assert!(matches!(
            TextPipeline::from_json("not a pipeline"),
            Err(PipelineError::Decode(_))
        ));
    }
}
