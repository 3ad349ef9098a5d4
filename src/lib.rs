//! truth-verify-api - backend for the video truth-verification landing site
//!
//! This crate provides:
//! - Contact-form intake with field-level validation
//! - Single-file video upload that creates an analysis record and completes it
//!   with synthesized metrics after a fixed delay (no real detection happens)
//! - Polling reads of analysis records
//! - An in-memory store behind an async trait, lost on restart

pub mod api;
pub mod clock;
pub mod config;
pub mod store;
pub mod synthesis;
pub mod workflow;

use std::sync::Arc;

use clock::Clock;
use config::Config;
use store::{AnalysisStore, MemStore};
use workflow::AnalysisWorkflow;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AnalysisStore>,
    pub workflow: AnalysisWorkflow,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn AnalysisStore>, clock: Arc<dyn Clock>) -> Self {
        let workflow = AnalysisWorkflow::new(Arc::clone(&store), clock, config.analysis_delay);
        Self {
            config,
            store,
            workflow,
        }
    }

    /// State backed by a fresh [`MemStore`] sharing `clock` with the workflow.
    pub fn in_memory(config: Config, clock: Arc<dyn Clock>) -> Self {
        let store: Arc<dyn AnalysisStore> = Arc::new(MemStore::new(Arc::clone(&clock)));
        Self::new(config, store, clock)
    }
}
