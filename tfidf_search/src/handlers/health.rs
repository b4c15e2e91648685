use actix_web::{web, HttpResponse};

use crate::models::{HealthResponse, RootResponse};
use crate::state::AppState;

pub const SERVICE_NAME: &str = "tfidf-search";

/// Liveness: answers without touching the backend.
pub async fn root_handler() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        status: "ok",
        service: SERVICE_NAME,
        message: "TF-IDF search service is running",
    })
}

/// Detailed health. Backend failures are reported in the body; the status is always 200.
pub async fn health_handler(state: web::Data<AppState>) -> HttpResponse {
    let qdrant = match state.backend.probe().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!("Qdrant health probe failed: {:#}", e);
            format!("error: {:#}", e)
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        qdrant,
        qdrant_url: state.config.qdrant_url.clone(),
        collection: state.config.collection.clone(),
        vectorizer_loaded: state.vectorizer_loaded(),
    })
}
