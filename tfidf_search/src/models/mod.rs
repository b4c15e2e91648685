use serde::Serialize;
use serde_json::{Map, Value};

pub mod params;

pub use params::*;

/// Non-zero entries of a TF-IDF vector. `indices` and `values` always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> anyhow::Result<Self> {
        if indices.len() != values.len() {
            anyhow::bail!(
                "Sparse vector has {} indices but {} values",
                indices.len(),
                values.len()
            );
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!("Sparse vector indices must be strictly ascending");
        }
        Ok(Self { indices, values })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Point identifier as stored in the vector database: numeric or UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PointIdValue {
    Num(u64),
    Uuid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: PointIdValue,
    pub score: f32,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub top_k: u64,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub qdrant: String,
    pub qdrant_url: String,
    pub collection: String,
    pub vectorizer_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
