//! Fitted classifiers. Each one resolves a feature vector to exactly one
//! category code: no threshold, no multi-label output.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::vectorizer::FeatureVector;
use crate::classifier::{read_artifact, ArtifactError, Classifier, SUPPORTED_FORMAT_VERSION};

/// On-disk shape of a fitted classifier, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierArtifact {
    Linear(LinearArtifact),
    Knn(KnnArtifact),
}

/// One-vs-rest linear decision functions, one row per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub format_version: u32,
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnArtifact {
    pub format_version: u32,
    pub k: usize,
    /// Vector dimension; must equal the vectorizer's vocabulary size.
    pub n_features: usize,
    /// Declared label set. When present, every sample label must be in it.
    #[serde(default)]
    pub classes: Vec<i64>,
    pub samples: Vec<KnnSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnSample {
    pub label: i64,
    /// Sparse `(column, weight)` pairs.
    pub features: Vec<(usize, f32)>,
}

impl ClassifierArtifact {
    fn format_version(&self) -> u32 {
        match self {
            ClassifierArtifact::Linear(a) => a.format_version,
            ClassifierArtifact::Knn(a) => a.format_version,
        }
    }
}

/// Loads a classifier artifact and builds the matching implementation.
pub fn load_classifier(path: impl AsRef<Path>) -> Result<Box<dyn Classifier>, ArtifactError> {
    let artifact: ClassifierArtifact = read_artifact(path.as_ref())?;
    classifier_from_artifact(artifact)
}

pub fn classifier_from_artifact(
    artifact: ClassifierArtifact,
) -> Result<Box<dyn Classifier>, ArtifactError> {
    let version = artifact.format_version();
    if version != SUPPORTED_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion(version));
    }
    match artifact {
        ClassifierArtifact::Linear(a) => Ok(Box::new(LinearClassifier::from_artifact(a)?)),
        ClassifierArtifact::Knn(a) => Ok(Box::new(KnnClassifier::from_artifact(a)?)),
    }
}

// Linear

#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    n_features: usize,
}

impl LinearClassifier {
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, ArtifactError> {
        let LinearArtifact {
            classes,
            coef,
            intercept,
            ..
        } = artifact;

        if classes.len() < 2 {
            return Err(ArtifactError::Invalid(
                "linear classifier needs at least two classes".to_string(),
            ));
        }
        // Binary models carry a single decision row scoring the second class.
        let expected_rows = if classes.len() == 2 { 1 } else { classes.len() };
        let rows_ok = coef.len() == classes.len() || coef.len() == expected_rows;
        if !rows_ok || intercept.len() != coef.len() {
            return Err(ArtifactError::Invalid(format!(
                "linear classifier has {} classes, {} coefficient rows and {} intercepts",
                classes.len(),
                coef.len(),
                intercept.len()
            )));
        }
        let n_features = coef[0].len();
        if n_features == 0 || coef.iter().any(|row| row.len() != n_features) {
            return Err(ArtifactError::Invalid(
                "linear classifier coefficient rows differ in length".to_string(),
            ));
        }

        Ok(Self {
            classes,
            coef,
            intercept,
            n_features,
        })
    }

    fn predict_one(&self, vector: &FeatureVector) -> i64 {
        if self.coef.len() == 1 {
            let score = vector.dot_dense(&self.coef[0]) + self.intercept[0];
            return if score > 0.0 {
                self.classes[1]
            } else {
                self.classes[0]
            };
        }

        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (i, (row, b)) in self.coef.iter().zip(&self.intercept).enumerate() {
            let score = vector.dot_dense(row) + b;
            // Strict comparison keeps the first class on ties.
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        self.classes[best]
    }
}

impl Classifier for LinearClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, batch: &[FeatureVector]) -> Vec<i64> {
        batch.iter().map(|v| self.predict_one(v)).collect()
    }
}

// k-nearest neighbours

/// Majority vote over the `k` most cosine-similar training samples.
/// Ties go to the larger summed similarity, then to the lower code.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    n_features: usize,
    samples: Vec<(i64, FeatureVector)>,
}

impl KnnClassifier {
    pub fn from_artifact(artifact: KnnArtifact) -> Result<Self, ArtifactError> {
        if artifact.k == 0 {
            return Err(ArtifactError::Invalid("knn classifier has k = 0".to_string()));
        }
        if artifact.samples.is_empty() {
            return Err(ArtifactError::Invalid(
                "knn classifier has no samples".to_string(),
            ));
        }
        if artifact.n_features == 0 {
            return Err(ArtifactError::Invalid(
                "knn classifier has n_features = 0".to_string(),
            ));
        }
        let n_features = artifact.n_features;
        if let Some(sample) = artifact
            .samples
            .iter()
            .find(|s| s.features.iter().any(|&(c, _)| c >= n_features))
        {
            return Err(ArtifactError::Invalid(format!(
                "knn sample labelled {} has a column beyond n_features {n_features}",
                sample.label
            )));
        }

        if !artifact.classes.is_empty() {
            if let Some(sample) = artifact
                .samples
                .iter()
                .find(|s| !artifact.classes.contains(&s.label))
            {
                return Err(ArtifactError::Invalid(format!(
                    "knn sample label {} is not among the declared classes",
                    sample.label
                )));
            }
        }

        let samples = artifact
            .samples
            .into_iter()
            .map(|s| (s.label, FeatureVector::new(n_features, s.features)))
            .collect();

        Ok(Self {
            k: artifact.k,
            n_features,
            samples,
        })
    }

    fn predict_one(&self, vector: &FeatureVector) -> i64 {
        let mut scored: Vec<(f32, i64)> = self
            .samples
            .iter()
            .map(|(label, sample)| (vector.cosine(sample), *label))
            .collect();
        // Stable sort: equal similarities keep artifact order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut votes: HashMap<i64, (usize, f32)> = HashMap::new();
        for (similarity, label) in scored.into_iter().take(self.k) {
            let entry = votes.entry(label).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += similarity;
        }

        votes
            .into_iter()
            .max_by(|(la, (ca, sa)), (lb, (cb, sb))| {
                ca.cmp(cb)
                    .then(sa.total_cmp(sb))
                    .then(lb.cmp(la))
            })
            .map(|(label, _)| label)
            .unwrap_or(self.samples[0].0)
    }
}

impl Classifier for KnnClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, batch: &[FeatureVector]) -> Vec<i64> {
        batch.iter().map(|v| self.predict_one(v)).collect()
    }
}
