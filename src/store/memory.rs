use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::models::{
    AnalysisStatus, Contact, NewContact, NewVideoAnalysis, UpsertUser, User, VideoAnalysis,
    VideoAnalysisUpdate,
};
use super::{AnalysisStore, StoreError};
use crate::clock::Clock;

/// Process-lifetime store. Nothing survives a restart.
pub struct MemStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    contacts: BTreeMap<u64, Contact>,
    users: HashMap<String, User>,
    video_analyses: BTreeMap<u64, VideoAnalysis>,
    next_contact_id: u64,
    next_video_id: u64,
}

impl MemStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(Tables {
                next_contact_id: 1,
                next_video_id: 1,
                ..Default::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl AnalysisStore for MemStore {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact, StoreError> {
        let mut tables = self.write()?;
        let id = tables.next_contact_id;
        tables.next_contact_id += 1;

        let contact = Contact {
            id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            company: contact.company.filter(|c| !c.is_empty()),
            message: contact.message,
            created_at: self.clock.now(),
        };
        tables.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        Ok(self.read()?.contacts.values().cloned().collect())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError> {
        let now = self.clock.now();
        let user = User {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at.unwrap_or(now),
            updated_at: now,
        };
        self.write()?.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn create_video_analysis(
        &self,
        analysis: NewVideoAnalysis,
    ) -> Result<VideoAnalysis, StoreError> {
        let mut tables = self.write()?;
        let id = tables.next_video_id;
        tables.next_video_id += 1;

        let record = VideoAnalysis {
            id,
            user_id: analysis.user_id,
            file_name: analysis.file_name,
            file_size: analysis.file_size,
            analysis_status: analysis
                .analysis_status
                .unwrap_or(AnalysisStatus::Processing),
            truth_score: analysis.truth_score,
            ai_confidence: analysis.ai_confidence,
            deepfake_detected: analysis.deepfake_detected.unwrap_or(false),
            manipulation_sources: analysis.manipulation_sources,
            blockchain_hash: analysis.blockchain_hash,
            analysis_results: analysis.analysis_results,
            created_at: self.clock.now(),
            completed_at: analysis.completed_at,
        };
        tables.video_analyses.insert(id, record.clone());
        Ok(record)
    }

    async fn get_video_analysis(&self, id: u64) -> Result<Option<VideoAnalysis>, StoreError> {
        Ok(self.read()?.video_analyses.get(&id).cloned())
    }

    async fn get_user_video_analyses(
        &self,
        user_id: &str,
    ) -> Result<Vec<VideoAnalysis>, StoreError> {
        Ok(self
            .read()?
            .video_analyses
            .values()
            .filter(|a| a.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn update_video_analysis(
        &self,
        id: u64,
        update: VideoAnalysisUpdate,
    ) -> Result<Option<VideoAnalysis>, StoreError> {
        let mut tables = self.write()?;
        let Some(record) = tables.video_analyses.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(record);
        Ok(Some(record.clone()))
    }

    async fn video_analysis_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.video_analyses.len())
    }
}
