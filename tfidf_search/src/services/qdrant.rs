use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    prelude::*,
    qdrant::{
        point_id::PointIdOptions, value::Kind, PointId, ScoredPoint, SearchPoints, SparseIndices,
        Value as QdrantValue,
    },
};
use serde_json::{Map, Number, Value};
use std::time::{Duration, Instant};

use tfidf_config::SearchConfig;

use crate::models::{PointIdValue, SearchResult};
use crate::services::backend::{SparseSearchBackend, SparseSearchRequest};

/// Qdrant gRPC client searching the named sparse vector of a collection.
pub struct QdrantService {
    client: QdrantClient,
    sparse_vector_name: String,
    timeout: Duration,
}

impl QdrantService {
    /// Builds the client without contacting the server; connection errors surface on first use.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        tracing::info!("Configuring Qdrant client for {}", config.qdrant_url);

        let timeout = config.timeout();
        let mut client_config = QdrantClient::from_url(&config.qdrant_url);
        client_config.set_timeout(timeout);
        client_config.set_connect_timeout(timeout);
        if let Some(api_key) = &config.qdrant_api_key {
            client_config.set_api_key(api_key);
        }

        let client = client_config
            .build()
            .map_err(|e| anyhow!("Failed to create Qdrant client: {}", e))?;

        Ok(Self {
            client,
            sparse_vector_name: config.sparse_vector_name.clone(),
            timeout,
        })
    }

    fn build_search(&self, request: SparseSearchRequest) -> SearchPoints {
        SearchPoints {
            collection_name: request.collection,
            vector: request.vector.values,
            sparse_indices: Some(SparseIndices {
                data: request.vector.indices,
            }),
            vector_name: Some(self.sparse_vector_name.clone()),
            limit: request.limit,
            with_payload: Some(request.with_payload.into()),
            with_vectors: Some(request.with_vectors.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SparseSearchBackend for QdrantService {
    async fn search_sparse(&self, request: SparseSearchRequest) -> Result<Vec<SearchResult>> {
        tracing::debug!(
            collection = %request.collection,
            terms = request.vector.len(),
            limit = request.limit,
            "Searching Qdrant"
        );

        let search = self.build_search(request);
        let start = Instant::now();

        let response = tokio::time::timeout(self.timeout, self.client.search_points(&search))
            .await
            .map_err(|_| anyhow!("Timeout searching collection {}", search.collection_name))?
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Qdrant search on {} failed", search.collection_name))?;

        tracing::debug!(
            results = response.result.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Qdrant search completed"
        );

        Ok(response.result.into_iter().map(scored_point_to_result).collect())
    }

    async fn probe(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.client.list_collections())
            .await
            .map_err(|_| anyhow!("Timeout listing collections"))?
            .map_err(|e| anyhow!("{}", e))?;
        Ok(())
    }
}

fn scored_point_to_result(point: ScoredPoint) -> SearchResult {
    SearchResult {
        id: point_id_value(point.id),
        score: point.score,
        payload: point
            .payload
            .into_iter()
            .map(|(key, value)| (key, qdrant_value_to_json(value)))
            .collect(),
    }
}

fn point_id_value(id: Option<PointId>) -> PointIdValue {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Num(n)) => PointIdValue::Num(n),
        Some(PointIdOptions::Uuid(uuid)) => PointIdValue::Uuid(uuid),
        None => PointIdValue::Uuid(String::new()),
    }
}

/// Structural conversion of a Qdrant payload value into JSON.
pub fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(object)) => Value::Object(
            object
                .fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
