//! leadsplit-server library
//!
//! Agent directory, lead upload and per-agent list distribution over HTTP.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod upload;

use db::{AgentDirectory, ListStore};
use upload::{UploadPipeline, UploadSettings};

/// Room for multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Shared secret for API authentication; 0 disables checks
    pub shared_secret: i64,
    pub directory: AgentDirectory,
    pub lists: ListStore,
    pub pipeline: UploadPipeline,
    pub uploads: UploadSettings,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64, uploads: UploadSettings) -> Self {
        let directory = AgentDirectory::new(db.clone());
        let lists = ListStore::new(db.clone());
        let pipeline = UploadPipeline::new(directory.clone(), lists.clone());

        Self {
            db,
            shared_secret,
            directory,
            lists,
            pipeline,
            uploads,
        }
    }
}

/// Build application router
///
/// `/health` is public; everything else passes the auth middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let body_limit = usize::try_from(state.uploads.max_bytes + MULTIPART_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);

    let protected = Router::new()
        .route("/agents", post(api::create_agent).get(api::list_agents))
        .route(
            "/agents/:id",
            put(api::update_agent).delete(api::delete_agent),
        )
        .route(
            "/upload",
            post(api::upload_leads).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/upload/lists", get(api::list_uploaded))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
