use std::sync::Arc;

use tfidf_config::SearchConfig;

use crate::errors::SearchError;
use crate::services::{QdrantService, SparseSearchBackend, TfidfVectorizer, UnavailableBackend, Vectorizer};

/// Process-wide context built once at startup and shared read-only with every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SearchConfig>,
    vectorizer: Result<Arc<dyn Vectorizer>, String>,
    pub backend: Arc<dyn SparseSearchBackend>,
}

impl AppState {
    pub fn new(
        config: SearchConfig,
        vectorizer: Result<Arc<dyn Vectorizer>, String>,
        backend: Arc<dyn SparseSearchBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            vectorizer,
            backend,
        }
    }

    /// Load the vectorizer and build the Qdrant client. Neither failure aborts startup.
    pub fn initialize(config: SearchConfig) -> Self {
        let vectorizer = match TfidfVectorizer::from_path(&config.vectorizer_path) {
            Ok(v) => {
                tracing::info!(
                    path = %config.vectorizer_path,
                    vocabulary = v.vocabulary_size(),
                    "Vectorizer loaded"
                );
                Ok(Arc::new(v) as Arc<dyn Vectorizer>)
            }
            Err(e) => {
                tracing::error!(path = %config.vectorizer_path, "Failed to load vectorizer: {:#}", e);
                Err(format!("{:#}", e))
            }
        };

        let backend: Arc<dyn SparseSearchBackend> = match QdrantService::new(&config) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                tracing::error!("{:#}", e);
                Arc::new(UnavailableBackend::new(format!("{:#}", e)))
            }
        };

        Self::new(config, vectorizer, backend)
    }

    pub fn vectorizer(&self) -> Result<&dyn Vectorizer, SearchError> {
        match &self.vectorizer {
            Ok(v) => Ok(v.as_ref()),
            Err(reason) => Err(SearchError::VectorizerUnavailable(reason.clone())),
        }
    }

    pub fn vectorizer_loaded(&self) -> bool {
        self.vectorizer.is_ok()
    }
}
