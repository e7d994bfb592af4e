//! Data types exchanged between the pipeline stages and the HTTP layer.
//!
//! Field names serialise in camelCase because the browser client posts
//! `userProfile`, `medicalHistory`, `testData` and reads the same keys back.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Patient details used to tailor the explanation and the chat context.
///
/// Every field is optional; the client may send a partially filled form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Age>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Prior conditions. Accepts a JSON list or a comma-separated string.
    #[serde(
        default,
        alias = "medical_history",
        deserialize_with = "deserialize_history",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub medical_history: Vec<String>,
}

impl UserProfile {
    /// True when the client sent no usable profile information.
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.age.is_none()
            && self.gender.as_deref().map_or(true, str::is_empty)
            && self.medical_history.is_empty()
    }
}

/// Age as sent by the client: form inputs arrive as strings, scripts send numbers.
///
/// Any JSON number is accepted; whole non-negative values land in `Years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Age {
    Years(u32),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Years(n) => write!(f, "{n}"),
            Age::Number(n) => write!(f, "{n}"),
            Age::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryInput {
    List(Vec<String>),
    Text(String),
}

fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<HistoryInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(HistoryInput::List(items)) => items,
        Some(HistoryInput::Text(text)) => text.split(',').map(str::to_string).collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Test name → reported value, in the order the model returned them.
///
/// Entries are normally `{ "value": 7.2, "unit": "10^3/uL" }` but bare
/// scalars are kept as-is; the model does not always follow the example shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestResults(pub Map<String, Value>);

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, test: &str) -> Option<&Value> {
        self.0.get(test)
    }

    pub fn insert(&mut self, test: impl Into<String>, value: Value) {
        self.0.insert(test.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// One `name: value unit` line per test.
    pub fn lines(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(test, value)| format!("{test}: {}", display_reading(value)))
            .collect()
    }
}

/// Render a single reading the way a patient would read it off the report.
pub fn display_reading(value: &Value) -> String {
    match value {
        Value::Object(fields) => {
            let v = fields.get("value").map(scalar_text).unwrap_or_default();
            let u = fields.get("unit").map(scalar_text).unwrap_or_default();
            format!("{v} {u}").trim().to_string()
        }
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of the extract → explain pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub test_data: TestResults,
    pub insight: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_accepts_list_history() {
        let p: UserProfile = serde_json::from_value(json!({
            "name": "Asha",
            "age": 52,
            "gender": "Female",
            "medicalHistory": ["diabetes", " thyroid "]
        }))
        .unwrap();
        assert_eq!(p.age, Some(Age::Years(52)));
        assert_eq!(p.medical_history, vec!["diabetes", "thyroid"]);
    }

    #[test]
    fn profile_accepts_comma_separated_history_and_snake_case() {
        let p: UserProfile = serde_json::from_value(json!({
            "age": "77",
            "medical_history": "diabetes, Blood Pressure,,"
        }))
        .unwrap();
        assert_eq!(p.age, Some(Age::Text("77".into())));
        assert_eq!(p.medical_history, vec!["diabetes", "Blood Pressure"]);
    }

    #[test]
    fn fractional_and_negative_ages_are_kept() {
        let p: UserProfile = serde_json::from_value(json!({ "age": 45.5 })).unwrap();
        assert!(matches!(p.age, Some(Age::Number(_))));
        assert_eq!(p.age.unwrap().to_string(), "45.5");

        let p: UserProfile = serde_json::from_value(json!({ "age": -1 })).unwrap();
        assert_eq!(p.age.unwrap().to_string(), "-1");

        let p: UserProfile = serde_json::from_value(json!({ "age": 77 })).unwrap();
        assert_eq!(p.age, Some(Age::Years(77)));
    }

    #[test]
    fn null_history_is_empty() {
        let p: UserProfile = serde_json::from_value(json!({ "medicalHistory": null })).unwrap();
        assert!(p.medical_history.is_empty());
        assert!(p.is_empty());
    }

    #[test]
    fn profile_serialises_camel_case() {
        let p = UserProfile {
            medical_history: vec!["asthma".into()],
            ..Default::default()
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, json!({ "medicalHistory": ["asthma"] }));
    }

    #[test]
    fn readings_render_value_and_unit() {
        assert_eq!(display_reading(&json!({ "value": 13.5, "unit": "g/dL" })), "13.5 g/dL");
        assert_eq!(display_reading(&json!({ "value": "Negative" })), "Negative");
        assert_eq!(display_reading(&json!({ "unit": "mg/dL" })), "mg/dL");
        assert_eq!(display_reading(&json!(98)), "98");
        assert_eq!(display_reading(&json!("Reactive")), "Reactive");
    }

    #[test]
    fn lines_keep_model_order() {
        let results: TestResults = serde_json::from_str(
            r#"{"WBC": {"value": 7.2, "unit": "10^3/uL"}, "HGB": {"value": 13.1, "unit": "g/dL"}, "ESR": 12}"#,
        )
        .unwrap();
        assert_eq!(
            results.lines(),
            vec!["WBC: 7.2 10^3/uL", "HGB: 13.1 g/dL", "ESR: 12"]
        );
    }

    #[test]
    fn analysis_uses_client_keys() {
        let a = Analysis {
            test_data: TestResults::new(),
            insight: "All normal.".into(),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v, json!({ "testData": {}, "insight": "All normal." }));
    }
}
