use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{SearchResult, SparseVector};

#[derive(Debug, Clone, PartialEq)]
pub struct SparseSearchRequest {
    pub collection: String,
    pub vector: SparseVector,
    pub limit: u64,
    pub with_payload: bool,
    pub with_vectors: bool,
}

/// Similarity search over sparse vectors in a remote vector database.
#[async_trait]
pub trait SparseSearchBackend: Send + Sync {
    /// Results ordered by descending score, at most `request.limit` of them.
    async fn search_sparse(&self, request: SparseSearchRequest) -> Result<Vec<SearchResult>>;

    /// Cheap metadata call used as a liveness check.
    async fn probe(&self) -> Result<()>;
}

/// Stands in for a client that could not be constructed; every call fails with the original error.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl SparseSearchBackend for UnavailableBackend {
    async fn search_sparse(&self, _request: SparseSearchRequest) -> Result<Vec<SearchResult>> {
        Err(anyhow!("Qdrant client unavailable: {}", self.reason))
    }

    async fn probe(&self) -> Result<()> {
        Err(anyhow!("Qdrant client unavailable: {}", self.reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_backend_fails_every_call() {
        let backend = UnavailableBackend::new("invalid uri");
        let request = SparseSearchRequest {
            collection: "docs".to_string(),
            vector: SparseVector::default(),
            limit: 5,
            with_payload: true,
            with_vectors: false,
        };

        let err = backend.search_sparse(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Qdrant client unavailable: invalid uri");
        assert!(backend.probe().await.is_err());
    }
}
