//! Explanation: test results + profile → plain-language insight.

use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::pipeline::llm::{complete_with_retry, CompletionBackend, Prompt};
use crate::pipeline::postprocess::clean_insight;
use crate::prompts::{explain_prompt, DEFAULT_EXPLAIN_PROMPT};
use crate::report::{TestResults, UserProfile};
use tracing::info;

/// Ask the model to explain `test_data` for the patient described by `profile`.
pub async fn explain(
    backend: &dyn CompletionBackend,
    test_data: &TestResults,
    profile: &UserProfile,
    config: &InsightConfig,
) -> Result<String, InsightError> {
    let preamble = config
        .explain_prompt
        .as_deref()
        .unwrap_or(DEFAULT_EXPLAIN_PROMPT);

    let prompt = Prompt::user(
        explain_prompt(preamble, test_data, profile),
        config.explain_temperature,
        config.max_tokens,
    );
    let completion = complete_with_retry(backend, &prompt, config, "explain").await?;
    let insight = clean_insight(&completion.content);
    info!("Explanation ready: {} chars", insight.len());
    Ok(insight)
}
