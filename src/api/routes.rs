use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = (state.config.max_upload_size as usize).saturating_add(MULTIPART_OVERHEAD);

    let api = Router::new()
        // Contacts
        .route(
            "/contacts",
            get(handlers::list_contacts).post(handlers::create_contact),
        )
        // Video analysis
        .route(
            "/video/upload",
            post(handlers::upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/video/analysis/:id", get(handlers::get_analysis))
        .route("/video/analyses", get(handlers::list_user_analyses));

    Router::new()
        .nest("/api", api)
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
