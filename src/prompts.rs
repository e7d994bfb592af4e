//! Prompt templates for the three LLM round-trips.
//!
//! Every prompt lives here so wording changes touch exactly one file and
//! unit tests can inspect the rendered text without calling a model.
//! The explanation and chat preambles can be overridden through
//! [`crate::config::InsightConfig`]; the extraction prompt cannot, because
//! its output shape is parsed by [`crate::pipeline::extract`].

use crate::report::{TestResults, UserProfile};
use crate::session::Turn;

/// Value-extraction prompt. `{report_text}` is replaced with the report.
pub const EXTRACT_VALUES_PROMPT: &str = r#"You are a medical assistant. Extract test values from the following report and return a structured JSON.

Example format:
{
  "WBC": { "value": ..., "unit": "..." },
  "HGB": { "value": ..., "unit": "..." },
  ...
}

Report:
--------------------
{report_text}
--------------------
Only include values mentioned. Don't guess or add extra."#;

/// Default preamble for the plain-language explanation.
pub const DEFAULT_EXPLAIN_PROMPT: &str = r#"You are a highly knowledgeable yet friendly doctor with a lot of experience from the world's best medical school.
Based on the following blood test results and the user's profile, analyze the report and explain the findings clearly in a crisp and to the point manner.
Don't give any unnecessary information.
Make sure the response reads well: use separate sections and put some things in point form.
Do not say that you are a doctor; just greet the patient and talk about the report.

### What you must include:
1. For each test with abnormal values, explain what it typically measures.
2. Mention if the value is too high, too low, or normal, and what that might mean.
3. Suggest possible medical conditions or causes if the value is abnormal.
4. Recommend practical advice or follow-up (like retesting, diet changes, consulting a doctor, etc.).
5. Keep the language simple, empathetic and suitable for a non-medical person.

### Do NOT:
- Do not return markdown, hashes, stars, or formatting.
- Do not include code blocks or JSON.
- Do not return generic messages like "I'm an AI language model...""#;

/// Default preamble for follow-up chat.
pub const DEFAULT_CHAT_PROMPT: &str =
    "You are a medical assistant helping a patient understand their test results.";

/// Render the extraction prompt for a report.
pub fn extract_values_prompt(report_text: &str) -> String {
    EXTRACT_VALUES_PROMPT.replace("{report_text}", report_text)
}

/// Render the explanation prompt.
///
/// Profile and test data are embedded as pretty JSON; models read nested
/// JSON more reliably than ad-hoc `key: value` lists for multi-field entries.
pub fn explain_prompt(preamble: &str, test_data: &TestResults, profile: &UserProfile) -> String {
    let profile_json = serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".into());
    let tests_json = serde_json::to_string_pretty(test_data).unwrap_or_else(|_| "{}".into());
    format!(
        "{preamble}\n\n### User Profile:\n{profile_json}\n\n### Test Results:\n{tests_json}\n\n\
Now give the explanation in clear human language:"
    )
}

/// Build the patient context block for chat.
///
/// Profile lines appear only when a profile was sent; the medical-history line
/// only when it is non-empty; the results block only when test data exists.
pub fn patient_context(profile: &UserProfile, test_data: &TestResults) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !profile.is_empty() {
        parts.push(format!("Patient: {}", profile.name.as_deref().unwrap_or("")));
        parts.push(format!(
            "Age: {}",
            profile.age.as_ref().map(|a| a.to_string()).unwrap_or_default()
        ));
        parts.push(format!("Gender: {}", profile.gender.as_deref().unwrap_or("")));
        if !profile.medical_history.is_empty() {
            parts.push(format!(
                "Medical History: {}",
                profile.medical_history.join(", ")
            ));
        }
    }

    if !test_data.is_empty() {
        parts.push(format!("Test Results:\n{}", test_data.lines().join("\n")));
    }

    parts.join("\n")
}

/// Render prior turns as a `Human:` / `AI:` transcript.
pub fn conversation_buffer(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("Human: {}\nAI: {}", t.question, t.reply))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full chat prompt for one question.
pub fn chat_prompt(preamble: &str, context: &str, history: &[Turn], question: &str) -> String {
    format!(
        "{preamble}\nHere's the patient context:\n{context}\n\n\
Current conversation:\n{}\n\n\
Patient question: {question}\nAssistant response:",
        conversation_buffer(history)
    )
}
