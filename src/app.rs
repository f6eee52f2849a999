use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Clock;
use crate::config;
use crate::handlers;
use crate::middleware::auth::access_token_middleware;
use crate::store::{ListOptions, TableStore};

/// Shared application state, injected into every handler as an extension.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, clock: Clock) -> Self {
        Self { store, clock }
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(api_routes())
        .layer(middleware::from_fn(request_logging))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Every /api route sits behind the access-token middleware.
fn api_routes() -> Router {
    Router::new()
        .route(
            "/api/agenda",
            get(handlers::agenda::get)
                .post(handlers::agenda::post)
                .patch(handlers::agenda::patch)
                .delete(handlers::agenda::delete),
        )
        .route(
            "/api/prospects/:statut",
            get(handlers::prospects::get)
                .post(handlers::prospects::post)
                .patch(handlers::prospects::patch),
        )
        .route(
            "/api/etablissements",
            get(handlers::etablissements::get)
                .post(handlers::etablissements::post)
                .patch(handlers::etablissements::patch),
        )
        .route(
            "/api/equipe",
            get(handlers::equipe::get)
                .post(handlers::equipe::post)
                .patch(handlers::equipe::patch)
                .delete(handlers::equipe::delete),
        )
        .route(
            "/api/facturation",
            get(handlers::facturation::get)
                .post(handlers::facturation::post)
                .patch(handlers::facturation::patch),
        )
        .route(
            "/api/publications",
            get(handlers::publications::get)
                .post(handlers::publications::post)
                .patch(handlers::publications::patch),
        )
        .route(
            "/api/publications/creneaux",
            get(handlers::creneaux::get).patch(handlers::creneaux::patch),
        )
        .route(
            "/api/profile",
            get(handlers::profile::get).patch(handlers::profile::patch),
        )
        .route(
            "/api/help",
            get(handlers::help::get).post(handlers::help::post),
        )
        .route("/api/ressources/canva", get(handlers::ressources::get_canva))
        .layer(middleware::from_fn(access_token_middleware))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "epicu-api",
        "environment": &config::config().environment,
        "endpoints": ["/health", "/api/*"],
    }))
}

/// Liveness plus a cheap store probe.
async fn health(Extension(state): Extension<AppState>) -> Json<Value> {
    let tables = &config::config().tables;
    let probe = state
        .store
        .list(tables.villes.as_str(), &ListOptions::default().with_max(1))
        .await;

    match probe {
        Ok(_) => Json(json!({ "status": "healthy", "store": "reachable" })),
        Err(e) => {
            tracing::warn!(error = %e, "health probe failed");
            Json(json!({ "status": "degraded", "store": "unreachable" }))
        }
    }
}

async fn request_logging(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    if !config::config().api.enable_request_logging {
        return next.run(request).await;
    }
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, path, status = %response.status(), "request");
    response
}
