//! Thesis Archive Backend
//!
//! A REST backend for a university thesis repository: students submit
//! capstone/thesis records, invited collaborators consent or decline,
//! librarians approve or reject gated on consent completion, and the
//! public browses approved works.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod query;
mod storage;
mod workflow;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use query::Queries;
use storage::FsBlobStore;
use workflow::Workflow;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub workflow: Arc<Workflow>,
    pub queries: Arc<Queries>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Thesis Archive Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Blob root: {:?}", config.blob_root);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (ARCHIVE_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize blob store
    let blobs = Arc::new(FsBlobStore::new(
        config.blob_root.clone(),
        config.public_base_url.clone(),
    ));

    // Create application state
    let state = AppState {
        workflow: Arc::new(Workflow::new(repo.clone(), blobs)),
        queries: Arc::new(Queries::new(repo.clone())),
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Theses
        .route("/theses", post(api::submit_thesis))
        .route("/theses", get(api::list_theses))
        .route("/theses/featured", get(api::get_featured))
        .route("/theses/{id}", get(api::get_thesis))
        .route("/theses/{id}", delete(api::delete_thesis))
        .route("/theses/{id}/decision", put(api::decide_thesis))
        .route("/theses/{id}/awardee", put(api::set_awardee))
        .route("/theses/{id}/featured", put(api::set_featured))
        .route("/college-stats", get(api::college_stats))
        .route("/my-submissions/{user_id}", get(api::my_submissions))
        // Collaboration requests
        .route("/collaboration-requests", get(api::list_pending_requests))
        .route("/collaboration-requests/{id}", put(api::respond_to_request))
        // Users
        .route("/users", get(api::list_students))
        .route("/users", post(api::create_user))
        .route("/users/by-id-number", get(api::get_student_by_id_number))
        .route("/users/{id}", put(api::update_user))
        .route("/users/{id}", delete(api::delete_user))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
