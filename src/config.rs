//! Configuration types for report analysis.
//!
//! All behaviour is controlled through [`InsightConfig`], built via its
//! [`InsightConfigBuilder`]. One struct is shared by the library facade,
//! the HTTP server and the CLI, so the three entry points cannot drift.

use crate::error::InsightError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Provider used when `GOOGLE_GEMINI_API_KEY` / `GEMINI_API_KEY` is set.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Upper bound for [`InsightConfigBuilder::max_retries`].
pub const MAX_RETRIES: u32 = 10;

/// Configuration for report analysis and chat.
///
/// # Example
/// ```rust
/// use labreport_insight::InsightConfig;
///
/// let config = InsightConfig::builder()
///     .model("gemini-2.5-flash")
///     .chat_temperature(0.3)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct InsightConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `provider`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for value extraction. Default: 0.2.
    ///
    /// Extraction is transcription: the reply must echo numbers from the
    /// report, not paraphrase them.
    pub extract_temperature: f32,

    /// Sampling temperature for the plain-language explanation. Default: 0.4.
    pub explain_temperature: f32,

    /// Sampling temperature for follow-up chat. Default: 0.3.
    pub chat_temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 4096.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Directory containing the pdfium shared library.
    /// If None, the system library search path is used.
    pub pdfium_dir: Option<PathBuf>,

    /// PDF user password for encrypted reports.
    pub pdf_password: Option<String>,

    /// Largest accepted request body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Replaces the built-in explanation preamble when set.
    pub explain_prompt: Option<String>,

    /// Replaces the built-in chat preamble when set.
    pub chat_prompt: Option<String>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            extract_temperature: 0.2,
            explain_temperature: 0.4,
            chat_temperature: 0.3,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            pdfium_dir: None,
            pdf_password: None,
            max_upload_bytes: 20 * 1024 * 1024,
            explain_prompt: None,
            chat_prompt: None,
        }
    }
}

impl fmt::Debug for InsightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("extract_temperature", &self.extract_temperature)
            .field("explain_temperature", &self.explain_temperature)
            .field("chat_temperature", &self.chat_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_dir", &self.pdfium_dir)
            .field("pdf_password", &self.pdf_password.as_ref().map(|_| "<redacted>"))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl InsightConfig {
    /// Create a new builder for `InsightConfig`.
    pub fn builder() -> InsightConfigBuilder {
        InsightConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name that will be requested from the provider.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// PDF options derived from this config.
    pub fn pdf_options(&self) -> crate::pipeline::pdf::PdfOptions {
        crate::pipeline::pdf::PdfOptions {
            pdfium_dir: self.pdfium_dir.clone(),
            password: self.pdf_password.clone(),
        }
    }
}

/// Builder for [`InsightConfig`].
#[derive(Debug)]
pub struct InsightConfigBuilder {
    config: InsightConfig,
}

impl InsightConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn extract_temperature(mut self, t: f32) -> Self {
        self.config.extract_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn explain_temperature(mut self, t: f32) -> Self {
        self.config.explain_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn chat_temperature(mut self, t: f32) -> Self {
        self.config.chat_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(MAX_RETRIES);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pdfium_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_dir = Some(dir.into());
        self
    }

    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn explain_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.explain_prompt = Some(prompt.into());
        self
    }

    pub fn chat_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.chat_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<InsightConfig, InsightError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(InsightError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(InsightError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes < 1024 {
            return Err(InsightError::InvalidConfig(format!(
                "max_upload_bytes must be at least 1 KiB, got {}",
                c.max_upload_bytes
            )));
        }
        if let Some(ref m) = c.model {
            if m.trim().is_empty() {
                return Err(InsightError::InvalidConfig("model must not be empty".into()));
            }
        }
        Ok(self.config)
    }
}
