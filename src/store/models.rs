use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-state patch value for partial updates of nullable fields.
/// Unlike `Option<Option<T>>`, each variant says what it means.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    /// Leave the field as it is.
    #[default]
    Absent,
    /// Clear the field.
    Null,
    /// Set the field to a new value.
    Value(T),
}

impl<T> Patch<T> {
    /// Overwrite `slot` according to the patch.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(v) => *slot = Some(v),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

// ============================================================================
// Contacts
// ============================================================================

/// A contact-form submission as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Contact fields supplied by the caller; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Video analyses
// ============================================================================

/// Lifecycle state of an analysis record.
///
/// `Failed` is part of the wire contract but nothing in the workflow sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalDetails {
    pub frame_rate: String,
    pub resolution: String,
    pub codec: String,
    pub bitrate: String,
}

/// Per-aspect scores. Derived from the truth score with jitter, so values may
/// fall slightly outside 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    pub visual_consistency: i32,
    pub audio_authenticity: i32,
    pub metadata_integrity: i32,
    pub blockchain_verification: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResults {
    pub technical_details: TechnicalDetails,
    pub verification_sources: Vec<String>,
    pub confidence_breakdown: ConfidenceBreakdown,
}

/// One video's verification lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub id: u64,
    pub user_id: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub analysis_status: AnalysisStatus,
    pub truth_score: Option<u8>,
    pub ai_confidence: Option<u8>,
    pub deepfake_detected: bool,
    pub manipulation_sources: Option<Vec<String>>,
    pub blockchain_hash: Option<String>,
    pub analysis_results: Option<AnalysisResults>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for a new analysis record. Anything left at its default is filled in
/// by the store (status `processing`, no results).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVideoAnalysis {
    pub user_id: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub analysis_status: Option<AnalysisStatus>,
    pub truth_score: Option<u8>,
    pub ai_confidence: Option<u8>,
    pub deepfake_detected: Option<bool>,
    pub manipulation_sources: Option<Vec<String>>,
    pub blockchain_hash: Option<String>,
    pub analysis_results: Option<AnalysisResults>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Shallow partial update of a [`VideoAnalysis`]. `id` and `created_at` are
/// not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoAnalysisUpdate {
    pub user_id: Patch<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub analysis_status: Option<AnalysisStatus>,
    pub truth_score: Patch<u8>,
    pub ai_confidence: Patch<u8>,
    pub deepfake_detected: Option<bool>,
    pub manipulation_sources: Patch<Vec<String>>,
    pub blockchain_hash: Patch<String>,
    pub analysis_results: Patch<AnalysisResults>,
    pub completed_at: Patch<DateTime<Utc>>,
}

impl VideoAnalysisUpdate {
    /// Merge this update into `record`.
    pub fn apply_to(self, record: &mut VideoAnalysis) {
        self.user_id.apply(&mut record.user_id);
        if let Some(file_name) = self.file_name {
            record.file_name = file_name;
        }
        if let Some(file_size) = self.file_size {
            record.file_size = file_size;
        }
        if let Some(status) = self.analysis_status {
            record.analysis_status = status;
        }
        self.truth_score.apply(&mut record.truth_score);
        self.ai_confidence.apply(&mut record.ai_confidence);
        if let Some(detected) = self.deepfake_detected {
            record.deepfake_detected = detected;
        }
        self.manipulation_sources
            .apply(&mut record.manipulation_sources);
        self.blockchain_hash.apply(&mut record.blockchain_hash);
        self.analysis_results.apply(&mut record.analysis_results);
        self.completed_at.apply(&mut record.completed_at);
    }
}
