//! Value extraction: report text → structured test results.

use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::pipeline::llm::{complete_with_retry, CompletionBackend, Prompt};
use crate::pipeline::postprocess::json_object_span;
use crate::prompts::extract_values_prompt;
use crate::report::TestResults;
use serde_json::Value;
use tracing::{debug, info};

/// Ask the model for the test values in `report_text` and parse its reply.
pub async fn extract_values(
    backend: &dyn CompletionBackend,
    report_text: &str,
    config: &InsightConfig,
) -> Result<TestResults, InsightError> {
    let prompt = Prompt::user(
        extract_values_prompt(report_text),
        config.extract_temperature,
        config.max_tokens,
    );
    let completion = complete_with_retry(backend, &prompt, config, "extract").await?;
    let results = parse_test_results(&completion.content)?;
    info!("Extracted {} test values", results.len());
    Ok(results)
}

/// Parse a model reply into [`TestResults`].
///
/// The reply must contain exactly one JSON object; fences and surrounding
/// prose are tolerated.
pub fn parse_test_results(reply: &str) -> Result<TestResults, InsightError> {
    let span = json_object_span(reply).ok_or_else(|| InsightError::MalformedExtraction {
        detail: format!("no JSON object in reply: {}", preview(reply)),
    })?;

    match serde_json::from_str::<Value>(&span) {
        Ok(Value::Object(map)) => Ok(TestResults(map)),
        Ok(other) => Err(InsightError::MalformedExtraction {
            detail: format!("expected a JSON object, got {}", type_name(&other)),
        }),
        Err(e) => {
            debug!("Unparseable extraction reply: {}", span);
            Err(InsightError::MalformedExtraction {
                detail: e.to_string(),
            })
        }
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(s: &str) -> String {
    let s = s.trim();
    match s.char_indices().nth(80) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
