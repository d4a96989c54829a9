//! Single-writer checkpoint actor.
//!
//! Workers hold a cloneable [`CheckpointSender`]; one task owns the store and
//! applies commands in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::CheckpointStore;
use crate::error::StorageError;
use crate::types::{Blueprint, Page, SectionFailure, SectionOutput, SectionStatus};

enum CheckpointCommand {
    ArchitectComplete { blueprint: Blueprint, pages: Vec<Page> },
    SectionOutput { output: SectionOutput, status: SectionStatus },
    SectionFailure(SectionFailure),
    PostcheckComplete,
    Finish,
}

/// What the writer did over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: usize,
    pub failed: usize,
    pub flushes: usize,
}

#[derive(Clone)]
pub struct CheckpointSender {
    sender: UnboundedSender<CheckpointCommand>,
}

impl CheckpointSender {
    fn send(&self, command: CheckpointCommand) -> Result<(), StorageError> {
        self.sender
            .send(command)
            .map_err(|_| StorageError::WriterClosed)
    }

    pub fn mark_architect_complete(&self, blueprint: &Blueprint, pages: &[Page]) -> Result<(), StorageError> {
        self.send(CheckpointCommand::ArchitectComplete {
            blueprint: blueprint.clone(),
            pages: pages.to_vec(),
        })
    }

    pub fn record_section_output(&self, output: SectionOutput, status: SectionStatus) -> Result<(), StorageError> {
        self.send(CheckpointCommand::SectionOutput { output, status })
    }

    pub fn record_section_failure(&self, failure: SectionFailure) -> Result<(), StorageError> {
        self.send(CheckpointCommand::SectionFailure(failure))
    }

    pub fn mark_postcheck_complete(&self) -> Result<(), StorageError> {
        self.send(CheckpointCommand::PostcheckComplete)
    }
}

pub struct CheckpointWriter {
    sender: CheckpointSender,
    handle: JoinHandle<Result<WriterStats, StorageError>>,
}

impl CheckpointWriter {
    /// Spawn the writer task. `batch_size` section records are written between
    /// explicit flushes.
    pub fn spawn(store: Arc<dyn CheckpointStore>, batch_size: usize) -> Self {
        let (sender, receiver) = unbounded_channel();
        let handle = tokio::spawn(run_writer(store, receiver, batch_size.max(1)));
        Self {
            sender: CheckpointSender { sender },
            handle,
        }
    }

    pub fn sender(&self) -> CheckpointSender {
        self.sender.clone()
    }

    /// Drain everything queued so far, flush, and stop the task.
    pub async fn finish(self) -> Result<WriterStats, StorageError> {
        self.sender.send(CheckpointCommand::Finish)?;
        self.handle
            .await
            .map_err(|e| StorageError::Backend(format!("checkpoint writer task failed: {}", e)))?
    }
}

async fn run_writer(
    store: Arc<dyn CheckpointStore>,
    mut receiver: UnboundedReceiver<CheckpointCommand>,
    batch_size: usize,
) -> Result<WriterStats, StorageError> {
    let mut stats = WriterStats::default();
    let mut since_flush = 0usize;

    while let Some(command) = receiver.recv().await {
        let is_section_record = matches!(
            command,
            CheckpointCommand::SectionOutput { .. } | CheckpointCommand::SectionFailure(_)
        );
        let result = match command {
            CheckpointCommand::Finish => break,
            CheckpointCommand::ArchitectComplete { blueprint, pages } => store
                .mark_architect_complete(&blueprint, &pages)
                .and_then(|_| store.flush()),
            CheckpointCommand::SectionOutput { output, status } => {
                store.record_section_output(&output, status)
            }
            CheckpointCommand::SectionFailure(failure) => store.record_section_failure(&failure),
            CheckpointCommand::PostcheckComplete => store.mark_postcheck_complete(),
        };

        match result {
            Ok(()) => stats.written += 1,
            Err(err) => {
                warn!(error = %err, "Checkpoint write failed");
                stats.failed += 1;
            }
        }

        if is_section_record {
            since_flush += 1;
            if since_flush >= batch_size {
                if let Err(err) = store.flush() {
                    warn!(error = %err, "Checkpoint flush failed");
                }
                stats.flushes += 1;
                since_flush = 0;
            }
        }
    }

    store.flush()?;
    stats.flushes += 1;
    debug!(
        written = stats.written,
        failed = stats.failed,
        flushes = stats.flushes,
        "Checkpoint writer finished"
    );
    Ok(stats)
}
