use actix_web::{http::Method, web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use std::collections::HashMap;

use crate::errors::{ApiResult, SearchError};
use crate::models::{RawSearchParams, SearchResponse};
use crate::services::search_tfidf;
use crate::state::AppState;

/// Upper bound on a buffered POST body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Buffer the request body up to [`MAX_BODY_BYTES`]. Read after the vectorizer
/// check so an oversize body never masks a missing model.
async fn read_body(mut payload: web::Payload) -> ApiResult<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!("Failed to read search body: {}", e);
            SearchError::BadRequest("Failed to read request body".to_string())
        })?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(SearchError::BadRequest(format!(
                "Request body exceeds {} bytes",
                MAX_BODY_BYTES
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// GET /search?query=...&top_k=5
/// POST /search {"query": "...", "top_k": 5}
pub async fn search_handler(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let vectorizer = state.vectorizer().map_err(|e| {
        tracing::warn!("Rejecting search: {}", e);
        e
    })?;

    let raw = if req.method() == Method::GET {
        let pairs = web::Query::<HashMap<String, String>>::from_query(req.query_string())
            .map(|q| q.into_inner())
            .unwrap_or_default();
        RawSearchParams::from_query_pairs(&pairs)
    } else {
        RawSearchParams::from_body(&read_body(payload).await?)
    };
    let params = raw.resolve()?;

    let results = search_tfidf(
        state.backend.as_ref(),
        &state.config.collection,
        &params.query,
        vectorizer,
        params.top_k,
    )
    .await
    .map_err(|e| {
        tracing::error!(query = %params.query, top_k = params.top_k, "Error in tfidf_search: {:#}", e);
        SearchError::from(e)
    })?;

    tracing::info!(
        top_k = params.top_k,
        results = results.len(),
        "Search completed"
    );

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: params.query,
        top_k: params.top_k,
        results,
    }))
}
