use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, Success};
use crate::store::models::VideoAnalysis;
use crate::workflow::{ensure_video, VideoUpload, WorkflowError};
use crate::AppState;

/// Multipart field carrying the video.
const VIDEO_FIELD: &str = "video";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub analysis_id: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalysisEnvelope {
    pub analysis: VideoAnalysis,
}

#[derive(Debug, Serialize)]
pub struct AnalysesEnvelope {
    pub analyses: Vec<VideoAnalysis>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalysesParams {
    pub user_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<UploadAccepted>>, ApiError> {
    // A request that is not multipart at all simply carries no file
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::bad_request("No video file provided"));
    };

    let mut upload: Option<VideoUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        // A plain text part named `video` is not a file
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if upload.is_some() {
            return Err(ApiError::bad_request("Only one video file may be uploaded"));
        }

        // Reject on the declared type before reading the body
        let content_type = field.content_type().map(|s| s.to_string());
        if let Err(e) = ensure_video(content_type.as_deref()) {
            tracing::debug!(file_name = %file_name, error = %e, "Rejected upload");
            return Err(ApiError::bad_request("Only video files are allowed"));
        }

        let mut file_size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file_size += chunk.len() as u64;
            if file_size > state.config.max_upload_size {
                return Err(too_large(state.config.max_upload_size));
            }
        }

        upload = Some(VideoUpload {
            file_name,
            content_type,
            file_size,
        });
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No video file provided"))?;

    let submission = state
        .workflow
        .submit(upload)
        .await
        .map_err(|e| match e {
            WorkflowError::NotVideo { .. } => ApiError::bad_request("Only video files are allowed"),
            other => {
                tracing::error!(error = %other, "Failed to create video analysis");
                ApiError::internal("Failed to process video upload")
            }
        })?;

    // Completion runs on its own; polling clients observe it
    let analysis_id = submission.analysis.id;
    drop(submission.completion);

    Ok(Success::with_message(
        UploadAccepted { analysis_id },
        "Video uploaded successfully. Analysis in progress...",
    ))
}

pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Success<AnalysisEnvelope>>, ApiError> {
    // Ids that are not numbers cannot exist
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::not_found("Analysis not found"))?;

    let analysis = state
        .workflow
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!(analysis_id = id, error = %e, "Failed to read analysis");
            ApiError::internal("Failed to retrieve analysis")
        })?
        .ok_or_else(|| ApiError::not_found("Analysis not found"))?;

    Ok(Success::new(AnalysisEnvelope { analysis }))
}

pub async fn list_user_analyses(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<UserAnalysesParams>,
) -> Result<Json<Success<AnalysesEnvelope>>, ApiError> {
    if params.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }

    let analyses = state
        .store
        .get_user_video_analyses(&params.user_id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %params.user_id, error = %e, "Failed to list analyses");
            ApiError::internal("Failed to retrieve analyses")
        })?;

    Ok(Success::new(AnalysesEnvelope { analyses }))
}

// ============================================================================
// Helpers
// ============================================================================

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File exceeds maximum upload size")
    } else {
        ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
    }
}

fn too_large(limit: u64) -> ApiError {
    ApiError::payload_too_large(format!(
        "File exceeds maximum upload size of {limit} bytes"
    ))
}
