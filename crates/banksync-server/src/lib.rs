//! HTTP front end for banksync.
//!
//! `GET|POST /api/sync` runs a bank sync. `POST /api/upload-csv` imports a
//! card statement sent as the multipart field `csv` and sits behind basic
//! auth. Responses are plain text.

pub mod auth;
mod handlers;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{any, get};
use axum::Router;
use banksync::config::BasicAuthCredentials;
use banksync::sync::SyncService;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
    pub basic_auth: Arc<BasicAuthCredentials>,
}

impl AppState {
    pub fn new(sync: SyncService, basic_auth: BasicAuthCredentials) -> Self {
        Self {
            sync: Arc::new(sync),
            basic_auth: Arc::new(basic_auth),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload = Router::new()
        .route("/api/upload-csv", any(handlers::upload_csv))
        .route_layer(from_fn_with_state(state.clone(), auth::require_basic_auth));

    Router::new()
        .route("/api/sync", get(handlers::sync).post(handlers::sync))
        .merge(upload)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
