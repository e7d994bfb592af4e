//! Report analysis entry points.
//!
//! [`ReportAnalyzer`] bundles the backend, the config and the session store,
//! and exposes the whole flow: PDF → text → test values → explanation, plus
//! follow-up chat. The HTTP server and the CLI both drive it.

use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::pipeline::llm::{CompletionBackend, ProviderBackend};
use crate::pipeline::{explain, extract, pdf};
use crate::report::{Analysis, TestResults, UserProfile};
use crate::session::{ChatReply, ChatRequest, SessionStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs the extract, explain and chat round-trips against one backend.
pub struct ReportAnalyzer {
    backend: Arc<dyn CompletionBackend>,
    config: InsightConfig,
    sessions: SessionStore,
}

impl ReportAnalyzer {
    /// Build an analyzer over an explicit backend.
    pub fn new(backend: Arc<dyn CompletionBackend>, config: InsightConfig) -> Self {
        Self {
            backend,
            config,
            sessions: SessionStore::new(),
        }
    }

    /// Build an analyzer whose backend is resolved from `config` and the environment.
    pub fn from_config(config: InsightConfig) -> Result<Self, InsightError> {
        let backend = ProviderBackend::from_config(&config)?;
        info!("Using LLM provider {}", backend.name());
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Plain text of a PDF on disk.
    pub async fn extract_pdf_text(&self, path: &Path) -> Result<String, InsightError> {
        pdf::extract_text(path, &self.config.pdf_options()).await
    }

    /// Plain text of an uploaded PDF.
    pub async fn extract_pdf_bytes(&self, bytes: &[u8]) -> Result<String, InsightError> {
        pdf::extract_text_from_bytes(bytes, &self.config.pdf_options()).await
    }

    /// Structured test values found in `report_text`.
    pub async fn extract_values(&self, report_text: &str) -> Result<TestResults, InsightError> {
        extract::extract_values(self.backend.as_ref(), report_text, &self.config).await
    }

    /// Plain-language explanation of `test_data` for `profile`.
    pub async fn explain(
        &self,
        test_data: &TestResults,
        profile: &UserProfile,
    ) -> Result<String, InsightError> {
        explain::explain(self.backend.as_ref(), test_data, profile, &self.config).await
    }

    /// Extract then explain.
    ///
    /// # Errors
    /// - [`InsightError::EmptyReport`] if `report_text` is blank
    /// - LLM and parse errors from either round-trip
    pub async fn analyze(
        &self,
        report_text: &str,
        profile: &UserProfile,
    ) -> Result<Analysis, InsightError> {
        if report_text.trim().is_empty() {
            return Err(InsightError::EmptyReport);
        }

        let start = Instant::now();
        let test_data = self.extract_values(report_text).await?;
        let insight = self.explain(&test_data, profile).await?;
        info!(
            "Analysis complete: {} values, {}ms",
            test_data.len(),
            start.elapsed().as_millis()
        );

        Ok(Analysis { test_data, insight })
    }

    /// Text extraction followed by [`Self::analyze`].
    pub async fn analyze_pdf(
        &self,
        path: &Path,
        profile: &UserProfile,
    ) -> Result<Analysis, InsightError> {
        let text = self.extract_pdf_text(path).await?;
        self.analyze(&text, profile).await
    }

    /// Answer a follow-up question within its session.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, InsightError> {
        self.sessions
            .chat(self.backend.as_ref(), request, &self.config)
            .await
    }
}
