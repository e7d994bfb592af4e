//! LLM interaction: the backend seam, retries and provider resolution.
//!
//! Prompt wording lives in [`crate::prompts`]; this module only moves text to
//! the provider and back. [`CompletionBackend`] is the single seam the rest of
//! the crate talks to, so tests can script replies without network access.
//!
//! ## Retry Strategy
//!
//! Each call is bounded by `api_timeout_secs`. Failures and timeouts are
//! retried `max_retries` times with exponential backoff
//! (`retry_backoff_ms * 2^attempt`): 500 ms → 1 s → 2 s with the defaults.

use crate::config::{InsightConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::InsightError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// One request to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Prompt {
    pub fn user(text: impl Into<String>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            system: None,
            user: text.into(),
            temperature,
            max_tokens,
        }
    }
}

/// A model reply with token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Anything that can answer a [`Prompt`].
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Send one prompt and return the reply. Implementations do not retry.
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, InsightError>;
}

/// [`CompletionBackend`] over an `edgequake_llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &InsightConfig) -> Result<Self, InsightError> {
        let (provider, label) = resolve_provider(config)?;
        Ok(Self::new(provider, label))
    }
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: &Prompt) -> Result<Completion, InsightError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = prompt.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(&prompt.user));

        let options = CompletionOptions {
            temperature: Some(prompt.temperature),
            max_tokens: Some(prompt.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| InsightError::LlmApiError {
                attempts: 1,
                message: e.to_string(),
            })?;

        Ok(Completion {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Call the backend with timeout and exponential-backoff retries.
///
/// `stage` names the pipeline step in log lines.
pub async fn complete_with_retry(
    backend: &dyn CompletionBackend,
    prompt: &Prompt,
    config: &InsightConfig,
    stage: &str,
) -> Result<Completion, InsightError> {
    let start = Instant::now();
    let limit = Duration::from_secs(config.api_timeout_secs);
    let mut last_err: Option<InsightError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                stage, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let outcome = match timeout(limit, backend.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(InsightError::ApiTimeout {
                secs: config.api_timeout_secs,
            }),
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "{}: {} input tokens, {} output tokens via {}, {:?}",
                    stage,
                    completion.input_tokens,
                    completion.output_tokens,
                    backend.name(),
                    start.elapsed()
                );
                return Ok(completion);
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", stage, attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    let attempts = config.max_retries + 1;
    Err(match last_err {
        Some(InsightError::ApiTimeout { secs }) if attempts == 1 => InsightError::ApiTimeout { secs },
        Some(e) => InsightError::LlmApiError {
            attempts,
            message: match e {
                InsightError::LlmApiError { message, .. } => message,
                other => other.to_string(),
            },
        },
        None => InsightError::Internal("retry loop ended without an attempt".into()),
    })
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, saturating.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, InsightError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        InsightError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini** when `GOOGLE_GEMINI_API_KEY` or `GEMINI_API_KEY` is set.
///    The former is copied into `GEMINI_API_KEY` for the provider factory.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
///
/// Returns the provider and a `provider/model` label for logs.
pub fn resolve_provider(
    config: &InsightConfig,
) -> Result<(Arc<dyn LLMProvider>, String), InsightError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), "custom".to_string()));
    }

    let model = config.model_or_default();

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, model)?, format!("{name}/{model}")));
    }

    if let (Some(prov), Some(env_model)) = (
        env_non_empty("EDGEQUAKE_LLM_PROVIDER"),
        env_non_empty("EDGEQUAKE_MODEL"),
    ) {
        let label = format!("{prov}/{env_model}");
        return Ok((create_provider(&prov, &env_model)?, label));
    }

    if env_non_empty("GEMINI_API_KEY").is_none() {
        if let Some(key) = env_non_empty("GOOGLE_GEMINI_API_KEY") {
            std::env::set_var("GEMINI_API_KEY", key);
        }
    }
    if env_non_empty("GEMINI_API_KEY").is_some() {
        return Ok((
            create_provider(DEFAULT_PROVIDER, model)?,
            format!("{DEFAULT_PROVIDER}/{model}"),
        ));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| InsightError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GOOGLE_GEMINI_API_KEY (default model {DEFAULT_MODEL}), OPENAI_API_KEY,\n\
                or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}
