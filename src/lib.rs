pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::{
    handlers::{account, auth as auth_handlers, billing, bio, docs, health, metrics, resumes, AppState},
    middleware::metrics_middleware,
    storage::UPLOADS_URL_PREFIX,
};

/// Room for the text fields that travel with an upload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/me", get(account::me))
        .route("/pricing", get(account::pricing))
        .route("/resumes", get(resumes::list_resumes))
        .route("/resumes/generate", post(resumes::generate_resume))
        .route(
            "/resumes/:id",
            get(resumes::view_resume)
                .put(resumes::edit_resume)
                .delete(resumes::delete_resume),
        )
        .route("/resumes/:id/duplicate", post(resumes::duplicate_resume))
        .route("/resumes/:id/download", get(resumes::download_resume))
        .route("/billing/tokens/:count", post(billing::buy_tokens))
        .route("/billing/upgrade/:plan", post(billing::upgrade))
        .route("/billing/purchases", get(billing::list_purchases))
        .route("/bio/regenerate", post(bio::regenerate_bio))
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api/v1", api_routes())
        .merge(docs::create_docs_router())
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(from_fn_with_state(state.clone(), metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
