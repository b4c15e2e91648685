use actix_web::{web, App, HttpServer};
use tfidf_config::SearchConfig;
use tfidf_observability::{info, init_tracing, observability, warn, TracingConfig};

use tfidf_search::{configure_routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing(TracingConfig::for_service("tfidf-search"));

    let config = SearchConfig::from_env();
    info!(?config, "Configuration loaded");

    let state = AppState::initialize(config.clone());
    if !state.vectorizer_loaded() {
        warn!("Starting without a vectorizer; /search will answer 500 until restarted");
    }
    let state = web::Data::new(state);

    let (host, port) = config.bind_address();
    let prefix = config.route_prefix.clone();
    info!("Starting TF-IDF search service on {}:{}{}", host, port, prefix);

    let mut server = HttpServer::new(move || {
        let prefix = prefix.clone();
        App::new()
            .wrap(observability("tfidf-search"))
            .app_data(state.clone())
            .configure(move |cfg| configure_routes(cfg, &prefix))
    });

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind((host.as_str(), port))?.run().await
}
