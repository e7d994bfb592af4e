//! Post-processing: deterministic cleanup of model replies.
//!
//! Even well-prompted models wrap JSON in ```` ```json ```` fences, add a
//! sentence before the object, or quote a whole chat reply. These rules fix
//! such quirks without touching content, so the prompts can stay focused on
//! *what* to produce.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").unwrap()
});

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

/// Remove one pair of outer code fences, with or without a language tag.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

/// Slice out the JSON object in a reply: fences removed, then everything from
/// the first `{` to the last `}`. Returns None if there is no such span.
pub fn json_object_span(reply: &str) -> Option<String> {
    let body = strip_code_fences(reply);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| body[start..=end].to_string())
}

/// Clean the plain-language explanation.
///
/// 1. Strip outer fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
pub fn clean_insight(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = s
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_LINES.replace_all(&s, "\n\n\n").trim().to_string()
}

/// Trim a chat reply and drop one pair of enclosing double quotes.
pub fn clean_reply(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.strip_prefix('"') {
        // a lone `"` is both the opening and the closing quote
        Some(rest) if trimmed.ends_with('"') => rest.strip_suffix('"').unwrap_or(rest).to_string(),
        _ => trimmed.to_string(),
    }
}
