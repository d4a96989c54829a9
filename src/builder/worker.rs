//! Section build worker pool.
//!
//! A fixed number of workers pull from one shared cursor over the pending
//! sections. Each worker runs a section's whole state machine (attempts,
//! degenerate-response retry, backoff, repair pass, fallback) before pulling the
//! next one, so at most `concurrency` sections are ever waiting on the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::classify::{classify_failure, is_repairable, is_transient};
use super::compliance::comply_component;
use super::fallback_block::build_deterministic_fallback_block;
use super::parse::{parse_section_payload, SectionPayload};
use super::prompt::{
    repair_prompt, section_prompt, section_tool, strict_retry_prompt, SectionPromptInput,
    BUILDER_SYSTEM,
};
use super::validate::validate_component;
use crate::cache::ContentCache;
use crate::checkpoint::CheckpointSender;
use crate::config::GenerationSettings;
use crate::error::SectionError;
use crate::gateway::{GatewayCall, ModelGateway};
use crate::guardian::{is_breakout_eligible, SiteTheme};
use crate::provider::ToolSpec;
use crate::template::{SectionTemplateResolver, TemplateQuery};
use crate::types::{
    BuilderSectionResult, ComponentManifest, FailureType, SectionContext, SectionFailure,
    SectionOutput, SectionStatus,
};

/// Temperature ceiling for the stricter retry after a degenerate response.
const STRICT_TEMPERATURE: f32 = 0.2;

/// Responses shorter than this (trimmed) are treated as degenerate.
const MIN_RESPONSE_CHARS: usize = 16;

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub concurrency: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl From<&GenerationSettings> for BuildSettings {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            concurrency: settings.section_concurrency.max(1),
            max_tokens: settings.builder_max_tokens,
            temperature: settings.builder_temperature,
            max_attempts: settings.builder_max_attempts.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }
}

/// Per-run inputs shared by every worker.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub prompt: String,
    pub theme: SiteTheme,
    pub manifest: ComponentManifest,
}

#[derive(Clone)]
pub struct SectionBuilder {
    gateway: Arc<ModelGateway>,
    cache: Arc<ContentCache>,
    templates: Arc<dyn SectionTemplateResolver>,
    settings: BuildSettings,
}

struct PoolShared {
    builder: SectionBuilder,
    job: Arc<BuildJob>,
    sections: Vec<SectionContext>,
    cursor: AtomicUsize,
    checkpoint: Option<CheckpointSender>,
}

pub fn is_degenerate(text: &str) -> bool {
    text.trim().len() < MIN_RESPONSE_CHARS || !text.contains('{')
}

impl SectionBuilder {
    pub fn new(
        gateway: Arc<ModelGateway>,
        cache: Arc<ContentCache>,
        templates: Arc<dyn SectionTemplateResolver>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            gateway,
            cache,
            templates,
            settings,
        }
    }

    /// Build every section and return one output per input, in input order.
    pub async fn build_all(
        &self,
        job: Arc<BuildJob>,
        sections: Vec<SectionContext>,
        checkpoint: Option<CheckpointSender>,
    ) -> Vec<SectionOutput> {
        if sections.is_empty() {
            return Vec::new();
        }
        let total = sections.len();
        let worker_count = self.settings.concurrency.clamp(1, total);
        let shared = Arc::new(PoolShared {
            builder: self.clone(),
            job,
            sections,
            cursor: AtomicUsize::new(0),
            checkpoint,
        });

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move { Self::worker_loop(worker_id, shared).await })
            })
            .collect();
        info!(worker_count, sections = total, "Started section workers");

        let mut slots: Vec<Option<SectionOutput>> = vec![None; total];
        for joined in join_all(handles).await {
            match joined {
                Ok(done) => {
                    for (index, output) in done {
                        slots[index] = Some(output);
                    }
                }
                Err(err) => error!(error = %err, "Section worker task failed"),
            }
        }

        slots
            .into_iter()
            .zip(shared.sections.iter())
            .map(|(slot, ctx)| slot.unwrap_or_else(|| abandoned_output(ctx, shared.checkpoint.as_ref())))
            .collect()
    }

    async fn worker_loop(worker_id: usize, shared: Arc<PoolShared>) -> Vec<(usize, SectionOutput)> {
        debug!(worker_id, "Section worker started");
        let mut done = Vec::new();
        loop {
            let index = shared.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(ctx) = shared.sections.get(index) else {
                break;
            };
            let output = shared
                .builder
                .build_section(&shared.job, ctx, shared.checkpoint.as_ref())
                .await;
            done.push((index, output));
        }
        debug!(worker_id, built = done.len(), "Section worker finished");
        done
    }

    /// Run one section through its state machine. Always produces an output.
    pub async fn build_section(
        &self,
        job: &BuildJob,
        ctx: &SectionContext,
        checkpoint: Option<&CheckpointSender>,
    ) -> SectionOutput {
        let key = ctx.key();
        let breakout = is_breakout_eligible(&ctx.section, &job.theme.contract);
        let base_prompt = section_prompt(
            &SectionPromptInput {
                prompt: &job.prompt,
                section: ctx,
                theme: &job.theme,
                manifest: &job.manifest,
                breakout_eligible: breakout,
            },
            &self.cache,
        );
        let tool = section_tool();
        let max_attempts = self.settings.max_attempts;
        let mut attempts = 0usize;
        let mut last: Option<(FailureType, SectionError)> = None;

        for attempt in 1..=max_attempts {
            attempts += 1;
            match self.attempt(job, ctx, &base_prompt, &tool, breakout).await {
                Ok(payload) => return self.finish_ok(ctx, payload, checkpoint),
                Err(err) => {
                    let failure = classify_failure(&err);
                    warn!(
                        section = %key,
                        attempt,
                        failure = %failure,
                        error = %err,
                        "Section attempt failed"
                    );
                    if attempt < max_attempts && is_transient(failure) {
                        sleep(self.settings.retry_delay * attempt as u32).await;
                    }
                    last = Some((failure, err));
                }
            }
        }

        let repair = match &last {
            Some((failure, err)) if is_repairable(*failure) => {
                Some(repair_prompt(&base_prompt, *failure, &err.to_string()))
            }
            _ => None,
        };
        if let Some(prompt) = repair {
            attempts += 1;
            debug!(section = %key, "Trying repair prompt");
            match self.attempt(job, ctx, &prompt, &tool, breakout).await {
                Ok(payload) => return self.finish_ok(ctx, payload, checkpoint),
                Err(err) => {
                    let failure = classify_failure(&err);
                    warn!(section = %key, failure = %failure, error = %err, "Repair attempt failed");
                    last = Some((failure, err));
                }
            }
        }

        let (failure, message) = match last {
            Some((failure, err)) => (failure, err.to_string()),
            None => (FailureType::Unknown, "no attempts were made".to_string()),
        };
        self.finish_fallback(job, ctx, failure, message, attempts, checkpoint)
    }

    async fn attempt(
        &self,
        job: &BuildJob,
        ctx: &SectionContext,
        prompt: &str,
        tool: &ToolSpec,
        breakout: bool,
    ) -> Result<SectionPayload, SectionError> {
        let text = self.call(prompt, self.settings.temperature, tool).await?;
        let text = if is_degenerate(&text) {
            debug!(section = %ctx.key(), "Degenerate response, retrying with a stricter prompt");
            let temperature = self.settings.temperature.min(STRICT_TEMPERATURE);
            let retry = self.call(&strict_retry_prompt(prompt), temperature, tool).await?;
            if is_degenerate(&retry) {
                return Err(SectionError::EmptyResponse);
            }
            retry
        } else {
            text
        };

        let payload = parse_section_payload(&text)?;
        let component = comply_component(payload.component, &job.theme.contract.tokens);
        validate_component(&component, &ctx.section, breakout)?;
        Ok(SectionPayload {
            component,
            block: payload.block,
        })
    }

    async fn call(&self, prompt: &str, temperature: f32, tool: &ToolSpec) -> Result<String, SectionError> {
        let text = self
            .gateway
            .call(GatewayCall {
                system: BUILDER_SYSTEM,
                prompt,
                temperature,
                max_tokens: self.settings.max_tokens,
                tool: Some(tool),
            })
            .await?;
        Ok(text)
    }

    fn finish_ok(
        &self,
        ctx: &SectionContext,
        payload: SectionPayload,
        checkpoint: Option<&CheckpointSender>,
    ) -> SectionOutput {
        let SectionPayload { component, mut block } = payload;
        block.ensure_identity(&ctx.section.id, &ctx.section.id);
        debug!(section = %ctx.key(), component = %component.name, "Section built");
        let output = section_output(ctx, BuilderSectionResult::Ok { component, block });
        if let Some(sender) = checkpoint {
            if let Err(err) = sender.record_section_output(output.clone(), SectionStatus::Ok) {
                warn!(section = %output.key, error = %err, "Failed to checkpoint section");
            }
        }
        output
    }

    fn finish_fallback(
        &self,
        job: &BuildJob,
        ctx: &SectionContext,
        failure: FailureType,
        error: String,
        attempts: usize,
        checkpoint: Option<&CheckpointSender>,
    ) -> SectionOutput {
        let section = &ctx.section;
        let query = TemplateQuery {
            prompt: &job.prompt,
            page_name: &ctx.page_name,
            section_type: &section.section_type,
            section_id: &section.id,
            section_intent: Some(&section.intent),
            id_base: &section.id,
            anchor: &section.id,
        };
        let mut block = match self.templates.resolve_section_template_block(&query) {
            Some(block) => {
                debug!(section = %ctx.key(), "Using style template for fallback");
                block
            }
            None => build_deterministic_fallback_block(&section.section_type, &section.id),
        };
        block.ensure_identity(&section.id, &section.id);

        warn!(
            section = %ctx.key(),
            failure = %failure,
            attempts,
            "Section degraded to fallback block"
        );
        let output = section_output(
            ctx,
            BuilderSectionResult::Fallback {
                block,
                error: error.clone(),
                failure_type: failure,
            },
        );
        if let Some(sender) = checkpoint {
            let failure_record = SectionFailure {
                key: output.key.clone(),
                page_path: ctx.page_path.clone(),
                section_id: section.id.clone(),
                failure_type: failure,
                error,
                attempts,
            };
            let recorded = sender
                .record_section_failure(failure_record)
                .and_then(|_| sender.record_section_output(output.clone(), SectionStatus::Fallback));
            if let Err(err) = recorded {
                warn!(section = %output.key, error = %err, "Failed to checkpoint section");
            }
        }
        output
    }
}

fn section_output(ctx: &SectionContext, result: BuilderSectionResult) -> SectionOutput {
    SectionOutput {
        key: ctx.key(),
        page_path: ctx.page_path.clone(),
        section_id: ctx.section.id.clone(),
        section_index: ctx.section_index,
        result,
    }
}

/// Output for a section whose worker died before reporting.
fn abandoned_output(ctx: &SectionContext, checkpoint: Option<&CheckpointSender>) -> SectionOutput {
    error!(section = %ctx.key(), "Section has no result");
    let output = section_output(
        ctx,
        BuilderSectionResult::Error {
            error: "section worker stopped before completing".to_string(),
            failure_type: FailureType::Unknown,
        },
    );
    if let Some(sender) = checkpoint {
        if let Err(err) = sender.record_section_output(output.clone(), SectionStatus::Error) {
            warn!(section = %output.key, error = %err, "Failed to checkpoint section");
        }
    }
    output
}
