//! Checkpoint collaborator
//!
//! Tracks phase and section completion so a killed run can resume without
//! redoing finished work. Reads happen once before a run starts; every write goes
//! through a single-writer actor so concurrent section completions never
//! interleave.

pub mod store;
pub mod writer;

use crate::blueprint::slugify;
use crate::error::StorageError;
use crate::types::{Blueprint, Page, SectionFailure, SectionOutput, SectionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub use store::SledCheckpointStore;
pub use writer::{CheckpointSender, CheckpointWriter, WriterStats};

/// Blueprint and normalized pages as saved when the architect stage finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectCheckpoint {
    pub blueprint: Blueprint,
    pub pages: Vec<Page>,
}

/// Persistence interface consulted by both stages.
pub trait CheckpointStore: Send + Sync {
    fn get_blueprint(&self) -> Result<Option<ArchitectCheckpoint>, StorageError>;

    /// Keys of sections recorded with status `ok`.
    fn get_completed_section_keys(&self) -> Result<HashSet<String>, StorageError>;

    fn get_section_outputs(&self) -> Result<Vec<SectionOutput>, StorageError>;

    fn mark_architect_complete(&self, blueprint: &Blueprint, pages: &[Page]) -> Result<(), StorageError>;

    fn record_section_output(&self, output: &SectionOutput, status: SectionStatus) -> Result<(), StorageError>;

    fn record_section_failure(&self, failure: &SectionFailure) -> Result<(), StorageError>;

    fn mark_postcheck_complete(&self) -> Result<(), StorageError>;

    fn flush(&self) -> Result<(), StorageError>;
}

/// Where and how a run checkpoints.
#[derive(Debug, Clone)]
pub struct PlanningOptions {
    pub dir: PathBuf,
    /// Derived from the prompt when absent
    pub request_id: Option<String>,
    /// Section records between explicit flushes
    pub batch_size: usize,
}

impl PlanningOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            request_id: None,
            batch_size: 1,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Explicit ids are slugified so they name a single directory.
    pub fn resolve_request_id(&self, prompt: &str) -> String {
        self.request_id
            .as_deref()
            .map(slugify)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| request_id_for(prompt))
    }
}

const REQUEST_ID_HEX_LEN: usize = 16;

/// Deterministic run identity: the first 16 hex chars of the prompt's blake3 hash.
pub fn request_id_for(prompt: &str) -> String {
    let hash = blake3::hash(prompt.trim().as_bytes());
    hex::encode(hash.as_bytes())[..REQUEST_ID_HEX_LEN].to_string()
}
