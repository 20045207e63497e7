//! Classifier pipeline: fitted vectorizer → fitted classifier → category lookup.
//!
//! Both artifacts are loaded once at startup and shared read-only. A failed
//! load never takes the process down: `ModelState` records what is missing,
//! `/health` reports it, and `/predict` rejects with `ModelUnavailable`.

pub mod categories;
pub mod model;
pub mod vectorizer;

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::classifier::model::load_classifier;
use crate::classifier::vectorizer::{FeatureVector, TfidfVectorizer};
use crate::errors::AppError;

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read artifact '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse artifact '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("unsupported artifact format_version {0} (expected {SUPPORTED_FORMAT_VERSION})")]
    UnsupportedVersion(u32),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

pub(crate) fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Maps text to fixed-length feature vectors. Takes a batch; a single document
/// is passed as a one-element slice.
pub trait Vectorizer: Send + Sync {
    fn dimension(&self) -> usize;
    fn transform(&self, batch: &[&str]) -> Vec<FeatureVector>;
}

/// Resolves each feature vector to exactly one category code.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;
    fn predict(&self, batch: &[FeatureVector]) -> Vec<i64>;
}

/// Outcome of classifying one cleaned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub code: i64,
    pub label: &'static str,
}

pub struct ClassifierPipeline {
    vectorizer: Arc<dyn Vectorizer>,
    classifier: Arc<dyn Classifier>,
}

impl ClassifierPipeline {
    pub fn new(
        vectorizer: Arc<dyn Vectorizer>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        if vectorizer.dimension() != classifier.n_features() {
            return Err(ArtifactError::Invalid(format!(
                "vectorizer produces {} features but classifier expects {}",
                vectorizer.dimension(),
                classifier.n_features()
            )));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn vectorize(&self, cleaned_text: &str) -> FeatureVector {
        self.vectorizer
            .transform(&[cleaned_text])
            .into_iter()
            .next()
            .unwrap_or_else(|| FeatureVector::new(self.vectorizer.dimension(), Vec::new()))
    }

    pub fn predict(&self, vector: FeatureVector) -> i64 {
        debug_assert_eq!(vector.dimension(), self.classifier.n_features());
        self.classifier
            .predict(std::slice::from_ref(&vector))
            .first()
            .copied()
            .unwrap_or(-1)
    }

    pub fn classify(&self, cleaned_text: &str) -> Prediction {
        let vector = self.vectorize(cleaned_text);
        if vector.is_zero() {
            debug!("No vocabulary terms in cleaned text; scoring the zero vector");
        }
        let code = self.predict(vector);
        Prediction {
            code,
            label: categories::lookup(code),
        }
    }
}

/// Load status of the two artifacts plus the assembled pipeline, if any.
#[derive(Clone)]
pub struct ModelState {
    vectorizer_loaded: bool,
    classifier_loaded: bool,
    pipeline: Result<Arc<ClassifierPipeline>, String>,
}

impl ModelState {
    /// Loads both artifacts, logging each failure. Never fails.
    pub fn load(vectorizer_path: &str, classifier_path: &str) -> Self {
        let vectorizer = match TfidfVectorizer::load(vectorizer_path) {
            Ok(v) => {
                info!("TF-IDF vectorizer loaded from {vectorizer_path}");
                Some(Arc::new(v) as Arc<dyn Vectorizer>)
            }
            Err(e) => {
                error!("Vectorizer unavailable: {e}");
                None
            }
        };
        let classifier = match load_classifier(classifier_path) {
            Ok(c) => {
                info!("Classifier loaded from {classifier_path}");
                Some(Arc::from(c))
            }
            Err(e) => {
                error!("Classifier unavailable: {e}");
                None
            }
        };
        Self::from_parts(vectorizer, classifier)
    }

    pub fn from_parts(
        vectorizer: Option<Arc<dyn Vectorizer>>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        let vectorizer_loaded = vectorizer.is_some();
        let classifier_loaded = classifier.is_some();

        let pipeline = match (vectorizer, classifier) {
            (Some(v), Some(c)) => ClassifierPipeline::new(v, c).map(Arc::new).map_err(|e| {
                error!("Model artifacts are incompatible: {e}");
                e.to_string()
            }),
            _ => Err("one or more artifacts failed to load".to_string()),
        };

        Self {
            vectorizer_loaded,
            classifier_loaded,
            pipeline,
        }
    }

    pub fn vectorizer_loaded(&self) -> bool {
        self.vectorizer_loaded
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier_loaded
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_ok()
    }

    pub fn pipeline(&self) -> Result<Arc<ClassifierPipeline>, AppError> {
        self.pipeline.clone().map_err(|_| {
            AppError::ModelUnavailable(
                "Model files are missing. Please check the server logs.".to_string(),
            )
        })
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::fixtures::tiny_pipeline;
    use super::*;

    #[test]
    fn test_classify_resolves_label() {
        let pipeline = tiny_pipeline().pipeline().unwrap();
        let prediction = pipeline.classify("experienced python developer django");
        assert_eq!(
            prediction,
            Prediction {
                code: 20,
                label: "Python Developer"
            }
        );
        assert_eq!(pipeline.classify("machine learning").label, "Data Science");
        assert_eq!(pipeline.classify("sales quota").label, "Sales");
    }

    #[test]
    fn test_classify_always_resolves_one_class() {
        let pipeline = tiny_pipeline().pipeline().unwrap();
        // Nothing in vocabulary: all scores tie at zero, first class wins.
        assert_eq!(pipeline.classify("cobol mainframe").code, 20);
    }

    #[test]
    fn test_unknown_code_resolves_to_sentinel() {
        struct Fixed;
        impl Classifier for Fixed {
            fn n_features(&self) -> usize {
                7
            }
            fn predict(&self, batch: &[FeatureVector]) -> Vec<i64> {
                vec![99; batch.len()]
            }
        }
        let base = tiny_pipeline();
        let vectorizer = base.pipeline().unwrap().vectorizer.clone();
        let state = ModelState::from_parts(Some(vectorizer), Some(Arc::new(Fixed)));
        let prediction = state.pipeline().unwrap().classify("python");
        assert_eq!(prediction.label, categories::UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_missing_artifacts_degrade_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let state = ModelState::load(
            dir.path().join("tfidf.json").to_str().unwrap(),
            dir.path().join("classifier.json").to_str().unwrap(),
        );
        assert!(!state.vectorizer_loaded());
        assert!(!state.classifier_loaded());
        assert!(!state.is_ready());
        assert!(matches!(state.pipeline(), Err(AppError::ModelUnavailable(_))));
    }

    #[test]
    fn test_corrupt_artifact_is_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer_path = dir.path().join("tfidf.json");
        let classifier_path = dir.path().join("classifier.json");
        std::fs::write(
            &vectorizer_path,
            r#"{"format_version": 1, "vocabulary": {"python": 0, "sales": 1}, "idf": [1.0, 1.0]}"#,
        )
        .unwrap();
        let mut file = std::fs::File::create(&classifier_path).unwrap();
        file.write_all(b"\x80\x04pickle bytes").unwrap();

        let state = ModelState::load(
            vectorizer_path.to_str().unwrap(),
            classifier_path.to_str().unwrap(),
        );
        assert!(state.vectorizer_loaded());
        assert!(!state.classifier_loaded());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_loads_artifacts_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer_path = dir.path().join("tfidf.json");
        let classifier_path = dir.path().join("classifier.json");
        std::fs::write(
            &vectorizer_path,
            r#"{"format_version": 1, "vocabulary": {"python": 0, "sales": 1}, "idf": [1.0, 1.0]}"#,
        )
        .unwrap();
        std::fs::write(
            &classifier_path,
            r#"{"kind": "linear", "format_version": 1, "classes": [20, 6, 22],
                "coef": [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0]], "intercept": [0.0, 0.0, 0.0]}"#,
        )
        .unwrap();

        let state = ModelState::load(
            vectorizer_path.to_str().unwrap(),
            classifier_path.to_str().unwrap(),
        );
        assert!(state.is_ready());
        assert_eq!(state.pipeline().unwrap().classify("sales").label, "Sales");
    }

    #[test]
    fn test_dimension_mismatch_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer_path = dir.path().join("tfidf.json");
        let classifier_path = dir.path().join("classifier.json");
        std::fs::write(
            &vectorizer_path,
            r#"{"format_version": 1, "vocabulary": {"python": 0}, "idf": [1.0]}"#,
        )
        .unwrap();
        std::fs::write(
            &classifier_path,
            r#"{"kind": "linear", "format_version": 1, "classes": [1, 2, 3],
                "coef": [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]], "intercept": [0.0, 0.0, 0.0]}"#,
        )
        .unwrap();

        let state = ModelState::load(
            vectorizer_path.to_str().unwrap(),
            classifier_path.to_str().unwrap(),
        );
        assert!(state.vectorizer_loaded());
        assert!(state.classifier_loaded());
        assert!(!state.is_ready());
    }
}
