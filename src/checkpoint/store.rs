//! Durable sled-backed checkpoint store, one database per request id.

use std::collections::HashSet;
use std::path::{Component as PathComponent, Path};

use serde::{Deserialize, Serialize};
use sled::{Db, Tree};

use super::{ArchitectCheckpoint, CheckpointStore};
use crate::error::StorageError;
use crate::types::{Blueprint, Page, SectionFailure, SectionOutput, SectionStatus};

const TREE_META: &str = "ckpt_meta";
const TREE_SECTIONS: &str = "ckpt_sections";
const TREE_FAILURES: &str = "ckpt_failures";

const KEY_ARCHITECT: &str = "architect";
const KEY_PHASES: &str = "phases";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseMeta {
    pub architect_complete: bool,
    pub postcheck_complete: bool,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SectionRecord {
    status: SectionStatus,
    output: SectionOutput,
}

#[derive(Clone)]
pub struct SledCheckpointStore {
    db: Db,
    meta: Tree,
    sections: Tree,
    failures: Tree,
}

impl SledCheckpointStore {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let meta = db.open_tree(TREE_META)?;
        let sections = db.open_tree(TREE_SECTIONS)?;
        let failures = db.open_tree(TREE_FAILURES)?;
        Ok(Self {
            db,
            meta,
            sections,
            failures,
        })
    }

    /// Open (or create) the store for `request_id` under `planning_dir`.
    /// The id must be a single plain path component.
    pub fn open(planning_dir: &Path, request_id: &str) -> Result<Self, StorageError> {
        let mut components = Path::new(request_id).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(PathComponent::Normal(_)), None)
        ) {
            return Err(StorageError::InvalidRequestId(request_id.to_string()));
        }
        std::fs::create_dir_all(planning_dir)?;
        let db = sled::open(planning_dir.join(request_id))?;
        Self::new(db)
    }

    pub fn phases(&self) -> Result<PhaseMeta, StorageError> {
        match self.meta.get(KEY_PHASES)? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => Ok(PhaseMeta::default()),
        }
    }

    fn update_phases(&self, update: impl FnOnce(&mut PhaseMeta)) -> Result<(), StorageError> {
        let mut phases = self.phases()?;
        update(&mut phases);
        phases.updated_at = Some(chrono::Utc::now().to_rfc3339());
        self.meta.insert(KEY_PHASES, serde_json::to_vec(&phases)?)?;
        Ok(())
    }

    pub fn failures(&self) -> Result<Vec<SectionFailure>, StorageError> {
        let mut out = Vec::new();
        for result in self.failures.iter() {
            let (_, value) = result?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}

impl CheckpointStore for SledCheckpointStore {
    fn get_blueprint(&self) -> Result<Option<ArchitectCheckpoint>, StorageError> {
        let Some(raw) = self.meta.get(KEY_ARCHITECT)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn get_completed_section_keys(&self) -> Result<HashSet<String>, StorageError> {
        let mut keys = HashSet::new();
        for result in self.sections.iter() {
            let (_, value) = result?;
            let record: SectionRecord = serde_json::from_slice(&value)?;
            if record.status == SectionStatus::Ok {
                keys.insert(record.output.key);
            }
        }
        Ok(keys)
    }

    fn get_section_outputs(&self) -> Result<Vec<SectionOutput>, StorageError> {
        let mut out = Vec::new();
        for result in self.sections.iter() {
            let (_, value) = result?;
            let record: SectionRecord = serde_json::from_slice(&value)?;
            out.push(record.output);
        }
        Ok(out)
    }

    fn mark_architect_complete(&self, blueprint: &Blueprint, pages: &[Page]) -> Result<(), StorageError> {
        let checkpoint = ArchitectCheckpoint {
            blueprint: blueprint.clone(),
            pages: pages.to_vec(),
        };
        self.meta
            .insert(KEY_ARCHITECT, serde_json::to_vec(&checkpoint)?)?;
        self.update_phases(|p| p.architect_complete = true)
    }

    fn record_section_output(&self, output: &SectionOutput, status: SectionStatus) -> Result<(), StorageError> {
        let record = SectionRecord {
            status,
            output: output.clone(),
        };
        self.sections
            .insert(output.key.as_bytes(), serde_json::to_vec(&record)?)?;
        if status == SectionStatus::Ok {
            self.failures.remove(output.key.as_bytes())?;
        }
        Ok(())
    }

    fn record_section_failure(&self, failure: &SectionFailure) -> Result<(), StorageError> {
        self.failures
            .insert(failure.key.as_bytes(), serde_json::to_vec(failure)?)?;
        Ok(())
    }

    fn mark_postcheck_complete(&self) -> Result<(), StorageError> {
        self.update_phases(|p| p.postcheck_complete = true)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
