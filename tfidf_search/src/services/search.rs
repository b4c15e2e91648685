use anyhow::{anyhow, Result};

use crate::models::SearchResult;
use crate::services::backend::{SparseSearchBackend, SparseSearchRequest};
use crate::services::vectorizer::Vectorizer;

/// TF-IDF search: vectorize `query` and run a sparse-only similarity search on `collection`.
///
/// Errors from the vectorizer or the backend are returned unchanged; there is
/// no retry and no partial result.
pub async fn search_tfidf(
    backend: &dyn SparseSearchBackend,
    collection: &str,
    query: &str,
    vectorizer: &dyn Vectorizer,
    top_k: u64,
) -> Result<Vec<SearchResult>> {
    let vector = vectorizer
        .transform(&[query])?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Vectorizer returned no vector for the query"))?;

    tracing::debug!(terms = vector.len(), top_k, "Query vectorized");

    backend
        .search_sparse(SparseSearchRequest {
            collection: collection.to_string(),
            vector,
            limit: top_k,
            with_payload: true,
            with_vectors: false,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PointIdValue, SparseVector};
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::Mutex;

    struct FixedVectorizer(Option<SparseVector>);

    impl Vectorizer for FixedVectorizer {
        fn transform(&self, documents: &[&str]) -> Result<Vec<SparseVector>> {
            match &self.0 {
                Some(v) => Ok(documents.iter().map(|_| v.clone()).collect()),
                None => Err(anyhow!("transform exploded")),
            }
        }

        fn vocabulary_size(&self) -> usize {
            1
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<SparseSearchRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl SparseSearchBackend for RecordingBackend {
        async fn search_sparse(&self, request: SparseSearchRequest) -> Result<Vec<SearchResult>> {
            let limit = request.limit;
            self.seen.lock().unwrap().push(request);
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok((0..limit.min(2))
                .map(|i| SearchResult {
                    id: PointIdValue::Num(i),
                    score: 1.0 - i as f32 * 0.1,
                    payload: Map::new(),
                })
                .collect())
        }

        async fn probe(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_search_sends_sparse_vector_with_payload() {
        let vector = SparseVector { indices: vec![2, 7], values: vec![0.6, 0.8] };
        let backend = RecordingBackend::default();

        let results = search_tfidf(&backend, "code_knowledge", "rust", &FixedVectorizer(Some(vector.clone())), 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            SparseSearchRequest {
                collection: "code_knowledge".to_string(),
                vector,
                limit: 5,
                with_payload: true,
                with_vectors: false,
            }
        );
    }

    #[tokio::test]
    async fn test_transform_error_skips_backend() {
        let backend = RecordingBackend::default();
        let err = search_tfidf(&backend, "c", "rust", &FixedVectorizer(None), 5)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "transform exploded");
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_propagates_unchanged() {
        let backend = RecordingBackend { fail: true, ..Default::default() };
        let err = search_tfidf(&backend, "c", "rust", &FixedVectorizer(Some(SparseVector::default())), 1)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }
}
