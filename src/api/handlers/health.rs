use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::Success;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub pending_analyses: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Success<HealthResponse>> {
    Success::new(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pending_analyses: state.workflow.pending(),
    })
}
