use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape of payloads returned by the bridge.
///
/// Fixed once at startup; `Legacy` unless configuration asks for `normalized`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Legacy,
    Normalized,
}

impl ResponseFormat {
    /// Parses a raw string, case-insensitively matching `normalized`.
    pub fn from_name(value: &str) -> Self {
        if value.eq_ignore_ascii_case("normalized") {
            Self::Normalized
        } else {
            Self::Legacy
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::Normalized)
    }
}

/// Resolves an arbitrary configuration value into a response format.
///
/// Non-string and absent values resolve to `Legacy`.
pub fn resolve_response_format(value: Option<&Value>) -> ResponseFormat {
    match value {
        Some(Value::String(raw)) => ResponseFormat::from_name(raw),
        _ => ResponseFormat::Legacy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_is_case_insensitive() {
        for raw in ["normalized", "NORMALIZED", "Normalized", "nOrMaLiZeD"] {
            assert_eq!(
                resolve_response_format(Some(&json!(raw))),
                ResponseFormat::Normalized
            );
        }
    }

    #[test]
    fn everything_else_is_legacy() {
        let inputs = [
            json!("legacy"),
            json!(""),
            json!(" normalized"),
            json!("normalised"),
            json!(1),
            json!(true),
            json!(null),
            json!({"responseFormat": "normalized"}),
            json!(["normalized"]),
        ];
        for input in inputs {
            assert_eq!(
                resolve_response_format(Some(&input)),
                ResponseFormat::Legacy,
                "{input}"
            );
        }
        assert_eq!(resolve_response_format(None), ResponseFormat::Legacy);
    }
}
