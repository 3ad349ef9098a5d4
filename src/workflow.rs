//! Lifecycle of a video analysis: create in `processing`, complete once after a
//! fixed delay, read any number of times in between.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::task::TaskTracker;

use crate::clock::Clock;
use crate::store::models::{AnalysisStatus, NewVideoAnalysis, VideoAnalysis, VideoAnalysisUpdate};
use crate::store::{AnalysisStore, StoreError};
use crate::synthesis;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Only video files are allowed (got {content_type})")]
    NotVideo { content_type: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Completion task failed: {0}")]
    Completion(#[from] JoinError),
}

/// What the transport layer knows about an uploaded file.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub file_size: u64,
}

/// A freshly created analysis and the handle of its pending completion.
#[derive(Debug)]
pub struct Submission {
    pub analysis: VideoAnalysis,
    pub completion: CompletionHandle,
}

/// Handle to one scheduled completion. Dropping it does not cancel anything.
#[derive(Debug)]
pub struct CompletionHandle {
    id: u64,
    handle: JoinHandle<Option<VideoAnalysis>>,
}

impl CompletionHandle {
    pub fn analysis_id(&self) -> u64 {
        self.id
    }

    /// Wait for the completion to run. `Ok(None)` means the record was gone
    /// or the store refused the update.
    pub async fn wait(self) -> Result<Option<VideoAnalysis>, WorkflowError> {
        Ok(self.handle.await?)
    }
}

/// Reject anything whose declared media type is not `video/*`.
pub fn ensure_video(content_type: Option<&str>) -> Result<(), WorkflowError> {
    let declared = content_type.unwrap_or("").trim();
    let essence = declared.split(';').next().unwrap_or("").trim();

    match essence.split_once('/') {
        Some((top, sub)) if top.eq_ignore_ascii_case("video") && !sub.is_empty() => Ok(()),
        _ => Err(WorkflowError::NotVideo {
            content_type: if declared.is_empty() {
                "none".to_string()
            } else {
                declared.to_string()
            },
        }),
    }
}

pub struct AnalysisWorkflow {
    store: Arc<dyn AnalysisStore>,
    clock: Arc<dyn Clock>,
    delay: Duration,
    tracker: TaskTracker,
}

impl AnalysisWorkflow {
    pub fn new(store: Arc<dyn AnalysisStore>, clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self {
            store,
            clock,
            delay,
            tracker: TaskTracker::new(),
        }
    }

    /// Create a `processing` record for `upload` and schedule its completion.
    ///
    /// Returns as soon as the record exists; the completion runs `delay` later
    /// on its own task whether or not the handle is kept.
    pub async fn submit(&self, upload: VideoUpload) -> Result<Submission, WorkflowError> {
        ensure_video(upload.content_type.as_deref())?;

        let analysis = self
            .store
            .create_video_analysis(NewVideoAnalysis {
                user_id: None,
                file_name: upload.file_name,
                file_size: upload.file_size,
                analysis_status: Some(AnalysisStatus::Processing),
                ..Default::default()
            })
            .await?;

        tracing::debug!(
            analysis_id = analysis.id,
            file_name = %analysis.file_name,
            file_size = analysis.file_size,
            "Created video analysis"
        );

        let completion = self.schedule_completion(analysis.id);
        Ok(Submission {
            analysis,
            completion,
        })
    }

    /// Current state of an analysis, whatever its status.
    pub async fn get(&self, id: u64) -> Result<Option<VideoAnalysis>, WorkflowError> {
        Ok(self.store.get_video_analysis(id).await?)
    }

    /// Number of completions still waiting to run.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every scheduled completion to finish. Used on shutdown, after
    /// the HTTP server has stopped taking uploads.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn schedule_completion(&self, id: u64) -> CompletionHandle {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let delay = self.delay;

        let handle = self.tracker.spawn(async move {
            tokio::time::sleep(delay).await;
            complete(store.as_ref(), clock.as_ref(), id).await
        });

        CompletionHandle { id, handle }
    }
}

async fn complete(store: &dyn AnalysisStore, clock: &dyn Clock, id: u64) -> Option<VideoAnalysis> {
    let update = completion_update(clock);

    match store.update_video_analysis(id, update).await {
        Ok(Some(analysis)) => {
            tracing::debug!(
                analysis_id = id,
                truth_score = ?analysis.truth_score,
                deepfake_detected = analysis.deepfake_detected,
                "Completed video analysis"
            );
            Some(analysis)
        }
        Ok(None) => {
            tracing::warn!(analysis_id = id, "Analysis vanished before completion");
            None
        }
        Err(e) => {
            tracing::error!(analysis_id = id, error = %e, "Failed to store analysis results");
            None
        }
    }
}

// ThreadRng is !Send, keep it out of the async state machine.
fn completion_update(clock: &dyn Clock) -> VideoAnalysisUpdate {
    synthesis::synthesize(&mut rand::thread_rng(), clock.now())
}
