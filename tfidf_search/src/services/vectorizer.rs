//! Query vectorization.
//!
//! The pretrained TF-IDF model is exported offline to a JSON artifact holding
//! the vocabulary, the IDF weights and the preprocessing options it was
//! fitted with. Loading validates the artifact once; `transform` is pure and
//! safe to call from any number of workers at the same time.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::models::SparseVector;

pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Maps text to sparse vectors. Implementations are immutable after construction.
pub trait Vectorizer: Send + Sync {
    /// One sparse vector per input document, in input order.
    fn transform(&self, documents: &[&str]) -> Result<Vec<SparseVector>>;

    fn vocabulary_size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, u32>,
    #[serde(default = "default_analyzer")]
    analyzer: String,
    #[serde(default)]
    idf: Option<Vec<f32>>,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    binary: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_analyzer() -> String {
    "word".to_string()
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

#[derive(Debug)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Option<Vec<f32>>,
    lowercase: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    binary: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .with_context(|| format!("Failed to read vectorizer file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid vectorizer artifact {}", path.display()))
    }

    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let artifact: VectorizerArtifact = serde_json::from_slice(raw)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        // Character n-gram analyzers would silently produce empty vectors here
        if artifact.analyzer != "word" {
            bail!("Unsupported analyzer {:?}, only \"word\" is supported", artifact.analyzer);
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("Invalid ngram_range ({}, {})", min_n, max_n);
        }

        let token_pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| anyhow!("Invalid token_pattern: {}", e))?;
        if token_pattern.captures_len() > 2 {
            bail!("token_pattern may contain at most one capturing group");
        }

        if let Some(idf) = &artifact.idf {
            if let Some((term, index)) = artifact
                .vocabulary
                .iter()
                .find(|(_, index)| **index as usize >= idf.len())
            {
                bail!(
                    "Vocabulary term {:?} has index {} but idf has only {} entries",
                    term,
                    index,
                    idf.len()
                );
            }
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            token_pattern,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            binary: artifact.binary,
            norm: artifact.norm,
        })
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<String> = if self.token_pattern.captures_len() == 2 {
            self.token_pattern
                .captures_iter(&text)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .collect()
        } else {
            self.token_pattern
                .find_iter(&text)
                .map(|m| m.as_str().to_string())
                .collect()
        };

        tokens
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect()
    }

    /// Word n-grams over the stop-word-filtered tokens, joined by a single space.
    fn ngrams(&self, tokens: Vec<String>) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        if max_n == 1 {
            return tokens;
        }

        let mut grams = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        grams
    }

    fn transform_one(&self, document: &str) -> Result<SparseVector> {
        // BTreeMap keeps output indices ascending
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for term in self.ngrams(self.tokenize(document)) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.binary {
                    1.0
                } else if self.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                let idf = self
                    .idf
                    .as_ref()
                    .map(|idf| idf[index as usize])
                    .unwrap_or(1.0);
                (index, tf * idf)
            })
            .collect();

        let magnitude = match self.norm {
            Some(Norm::L2) => weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt(),
            Some(Norm::L1) => weights.iter().map(|(_, w)| w.abs()).sum::<f32>(),
            None => 1.0,
        };
        if magnitude > 0.0 {
            for (_, w) in weights.iter_mut() {
                *w /= magnitude;
            }
        }

        let (indices, values) = weights.into_iter().unzip();
        SparseVector::new(indices, values)
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, documents: &[&str]) -> Result<Vec<SparseVector>> {
        documents.iter().map(|d| self.transform_one(d)).collect()
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}
