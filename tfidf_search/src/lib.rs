//! HTTP front-end for TF-IDF sparse-vector search over Qdrant.
//!
//! Queries are turned into sparse vectors by a pretrained [`services::Vectorizer`]
//! and searched against one Qdrant collection. Ranking is entirely the
//! database's; this crate parses requests, calls through, and reshapes results.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use actix_web::web;

pub use errors::{ApiResult, SearchError};
pub use state::AppState;

/// Register every route under `prefix` (`""` or `/segment`). With a prefix, the
/// bare `/segment` path answers like `/segment/`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, prefix: &str) {
    let mut scope = web::scope(prefix).route("/", web::get().to(handlers::root_handler));
    if !prefix.is_empty() {
        scope = scope.route("", web::get().to(handlers::root_handler));
    }

    cfg.service(
        scope
            .route("/health", web::get().to(handlers::health_handler))
            .service(
                web::resource("/search")
                    .route(web::get().to(handlers::search_handler))
                    .route(web::post().to(handlers::search_handler)),
            ),
    );
}
