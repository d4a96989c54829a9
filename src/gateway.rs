//! Model Gateway
//!
//! Single choke point for every model call: clamps the token budget, forces
//! structured output when a tool schema is given, and applies the failure policy
//! (one lowered-budget retry on affordability errors, then one fallback model).

use crate::error::{GatewayError, ProviderError};
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient, ToolSpec};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static AFFORDABLE_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)can only afford (\d+)").expect("valid regex"));

/// Headroom subtracted from the affordable count before retrying.
const AFFORDABILITY_MARGIN: u32 = 64;

/// One model call.
#[derive(Debug, Clone, Copy)]
pub struct GatewayCall<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tool: Option<&'a ToolSpec>,
}

pub struct ModelGateway {
    primary: Arc<dyn ModelProviderClient>,
    fallback: Option<Arc<dyn ModelProviderClient>>,
    min_tokens: u32,
    max_tokens: u32,
}

impl ModelGateway {
    pub fn new(
        primary: Arc<dyn ModelProviderClient>,
        fallback: Option<Arc<dyn ModelProviderClient>>,
        min_tokens: u32,
        max_tokens: u32,
    ) -> Self {
        let min_tokens = min_tokens.max(1);
        Self {
            primary,
            fallback,
            min_tokens,
            max_tokens: max_tokens.max(min_tokens),
        }
    }

    pub fn primary_model(&self) -> &str {
        self.primary.model_name()
    }

    pub fn clamp_tokens(&self, requested: u32) -> u32 {
        requested.clamp(self.min_tokens, self.max_tokens)
    }

    /// Run one call through the failure policy and return the response text.
    pub async fn call(&self, call: GatewayCall<'_>) -> Result<String, GatewayError> {
        let budget = self.clamp_tokens(call.max_tokens);

        let err = match self.call_model(self.primary.as_ref(), &call, budget).await {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        if let Some(fallback) = &self.fallback {
            if !err.is_connection_failure() {
                warn!(
                    primary = self.primary.model_name(),
                    fallback = fallback.model_name(),
                    error = %err,
                    "Primary model failed, trying fallback model"
                );
                match self.call_model(fallback.as_ref(), &call, budget).await {
                    Ok(text) => return Ok(text),
                    Err(fallback_err) => {
                        warn!(
                            model = fallback.model_name(),
                            error = %fallback_err,
                            "Fallback model failed"
                        );
                    }
                }
            }
        }

        Err(GatewayError::from_provider(self.primary.model_name(), &err))
    }

    /// Call one model, retrying once at a lowered budget on affordability errors.
    async fn call_model(
        &self,
        client: &dyn ModelProviderClient,
        call: &GatewayCall<'_>,
        budget: u32,
    ) -> Result<String, ProviderError> {
        match self.attempt(client, call, budget).await {
            Ok(text) => Ok(text),
            Err(err) => {
                let Some(affordable) = affordable_tokens(&err) else {
                    return Err(err);
                };
                let lowered =
                    self.clamp_tokens(budget.min(affordable.saturating_sub(AFFORDABILITY_MARGIN)));
                if lowered >= budget {
                    return Err(err);
                }
                warn!(
                    model = client.model_name(),
                    requested = budget,
                    lowered,
                    "Retrying with a lowered token budget"
                );
                self.attempt(client, call, lowered).await
            }
        }
    }

    async fn attempt(
        &self,
        client: &dyn ModelProviderClient,
        call: &GatewayCall<'_>,
        budget: u32,
    ) -> Result<String, ProviderError> {
        debug!(
            model = client.model_name(),
            max_tokens = budget,
            structured = call.tool.is_some(),
            "Model call"
        );
        let messages = vec![ChatMessage::system(call.system), ChatMessage::user(call.prompt)];
        let options = CompletionOptions {
            temperature: Some(call.temperature),
            max_tokens: Some(budget),
            tool: call.tool.cloned(),
        };
        let response = client.complete(messages, options).await?;
        Ok(response.into_text())
    }
}

/// Parse the affordable token count out of a quota error message.
pub fn affordable_tokens(err: &ProviderError) -> Option<u32> {
    AFFORDABLE_TOKENS
        .captures(err.message())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
