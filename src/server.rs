use crate::handlers::{self, method_not_allowed};
use crate::state::AppState;
use axum::{
    http::{header::CACHE_CONTROL, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use hyper::Server;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Manifest and images never change for a deployed build
const STATIC_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Create the HTTP router: the onboarding API plus the Mini App's static assets
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&state.config.server.static_dir));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/intro", post(handlers::intro).fallback(method_not_allowed))
        .route("/api/quiz", post(handlers::quiz).fallback(method_not_allowed))
        .route("/api/mint", post(handlers::mint).fallback(method_not_allowed))
        .route("/api/state", get(handlers::get_state).fallback(method_not_allowed))
        .route("/api/reset", post(handlers::reset).fallback(method_not_allowed))
        .fallback_service(static_files)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
