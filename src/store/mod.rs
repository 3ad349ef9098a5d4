mod memory;
pub mod models;

pub use memory::MemStore;

use async_trait::async_trait;
use thiserror::Error;

use models::{
    Contact, NewContact, NewVideoAnalysis, UpsertUser, User, VideoAnalysis, VideoAnalysisUpdate,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,
}

/// Repository for contacts, users and video analyses.
///
/// Each entity kind has its own id namespace. Lookups of unknown ids return
/// `Ok(None)`; `Err` is reserved for the store itself failing.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact, StoreError>;
    /// All contacts, ascending by id.
    async fn get_contacts(&self) -> Result<Vec<Contact>, StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError>;

    async fn create_video_analysis(
        &self,
        analysis: NewVideoAnalysis,
    ) -> Result<VideoAnalysis, StoreError>;
    async fn get_video_analysis(&self, id: u64) -> Result<Option<VideoAnalysis>, StoreError>;
    /// Analyses owned by `user_id`, ascending by id.
    async fn get_user_video_analyses(
        &self,
        user_id: &str,
    ) -> Result<Vec<VideoAnalysis>, StoreError>;
    async fn update_video_analysis(
        &self,
        id: u64,
        update: VideoAnalysisUpdate,
    ) -> Result<Option<VideoAnalysis>, StoreError>;
    async fn video_analysis_count(&self) -> Result<usize, StoreError>;
}
