//! REST surface over the token store and the sync orchestrator.

pub mod auth;
mod error;
pub mod handlers;

pub use auth::AdminAuth;
pub use error::ApiError;

use crate::store::TokenStore;
use crate::sync::SyncOrchestrator;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TokenStore>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub auth: Arc<AdminAuth>,
    pub cron_secret: Option<String>,
}

pub fn router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let admin = Router::new()
        .route("/api/check-auth", get(auth::check_auth))
        .route("/api/tokens/:token_index", put(handlers::update_token))
        .route("/api/update", post(handlers::trigger_update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/tokens", get(handlers::list_tokens))
        .route("/api/cron", post(handlers::cron))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// Credentials need an explicit origin; without one the API is open.
fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION]),
        None => CorsLayer::permissive(),
    }
}
