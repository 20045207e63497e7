//! TF-IDF vectorizer backed by a fitted artifact. Vocabulary and IDF weights
//! are fixed at training time; nothing here learns.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::{read_artifact, ArtifactError, Vectorizer, SUPPORTED_FORMAT_VERSION};

/// Runs of two or more word characters, the fitted token pattern.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sparse feature vector of fixed dimension. Entries are sorted by column and
/// columns are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f32)>,
}

impl FeatureVector {
    /// Builds a vector from `(column, weight)` pairs. Columns at or beyond
    /// `dimension` and zero weights are dropped; duplicate columns are summed.
    pub fn new(dimension: usize, mut entries: Vec<(usize, f32)>) -> Self {
        entries.retain(|&(column, weight)| column < dimension && weight != 0.0);
        entries.sort_by_key(|&(column, _)| column);
        let mut merged: Vec<(usize, f32)> = Vec::with_capacity(entries.len());
        for (column, weight) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == column => *acc += weight,
                _ => merged.push((column, weight)),
            }
        }
        Self {
            dimension,
            entries: merged,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product with a dense weight row. Columns past the row's end count as zero.
    pub fn dot_dense(&self, row: &[f32]) -> f32 {
        self.entries
            .iter()
            .filter_map(|&(column, weight)| row.get(column).map(|r| r * weight))
            .sum()
    }

    /// Dot product with another sparse vector.
    pub fn dot(&self, other: &FeatureVector) -> f32 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (ci, wi) = self.entries[i];
            let (cj, wj) = other.entries[j];
            match ci.cmp(&cj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; zero when either side is the zero vector.
    pub fn cosine(&self, other: &FeatureVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            0.0
        } else {
            self.dot(other) / denom
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// On-disk shape of a fitted vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfArtifact {
    pub format_version: u32,
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    sublinear_tf: bool,
    norm: Norm,
    ngram_range: (usize, usize),
}

impl TfidfVectorizer {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let artifact: TfidfArtifact = read_artifact(path.as_ref())?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, ArtifactError> {
        if artifact.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(artifact.format_version));
        }
        if artifact.idf.is_empty() {
            return Err(ArtifactError::Invalid(
                "vectorizer has an empty idf table".to_string(),
            ));
        }
        if let Some(w) = artifact.idf.iter().find(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "vectorizer idf contains non-finite weight {w}"
            )));
        }
        let dimension = artifact.idf.len();
        if let Some((term, column)) = artifact.vocabulary.iter().find(|(_, &c)| c >= dimension) {
            return Err(ArtifactError::Invalid(format!(
                "term '{term}' maps to column {column}, but idf has {dimension} entries"
            )));
        }
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::Invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            ngram_range: artifact.ngram_range,
        })
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN.find_iter(&lowered).map(|m| m.as_str()).collect();
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n == 1 {
                terms.extend(tokens.iter().map(|t| t.to_string()));
            } else {
                terms.extend(tokens.windows(n).map(|w| w.join(" ")));
            }
        }
        terms
    }

    fn transform_one(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in self.terms(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (column, tf * self.idf[column])
            })
            .collect();

        if self.norm == Norm::L2 {
            let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in entries.iter_mut() {
                    *w /= norm;
                }
            }
        }

        FeatureVector::new(self.idf.len(), entries)
    }
}

impl Vectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, batch: &[&str]) -> Vec<FeatureVector> {
        batch.iter().map(|text| self.transform_one(text)).collect()
    }
}
