use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Component, Path, PathBuf};

use super::format::ResponseFormat;

/// Recording payload produced once a session stops successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub record_data_base64: Option<String>,
    pub ms_duration: i64,
    pub mime_type: String,
    pub uri: Option<String>,
}

impl RecordData {
    /// Flat legacy shape: every key present, absent values as empty strings.
    pub fn to_legacy(&self) -> Value {
        json!({
            "recordDataBase64": self.record_data_base64.clone().unwrap_or_default(),
            "msDuration": self.ms_duration,
            "mimeType": self.mime_type,
            "uri": self.uri.clone().unwrap_or_default(),
        })
    }

    /// Normalized shape: `uri` XOR `recordDataBase64`, URI preferred.
    pub fn to_normalized(&self) -> Value {
        let mut normalized = Map::new();
        normalized.insert("msDuration".into(), json!(self.ms_duration));
        normalized.insert("mimeType".into(), json!(self.mime_type));

        if let Some(uri) = self.uri.as_deref().and_then(normalize_uri) {
            normalized.insert("uri".into(), json!(uri));
        } else if let Some(base64) = self
            .record_data_base64
            .as_deref()
            .filter(|value| !value.is_empty())
        {
            normalized.insert("recordDataBase64".into(), json!(base64));
        }

        Value::Object(normalized)
    }

    pub fn to_payload(&self, format: ResponseFormat) -> Value {
        match format {
            ResponseFormat::Legacy => self.to_legacy(),
            ResponseFormat::Normalized => self.to_normalized(),
        }
    }
}

/// MIME type for a recording file extension.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" | "webm" => "audio/ogg",
        _ => "audio/aac",
    }
}

/// Turns a bare file path into a `file://` URI; scheme-prefixed values pass through.
pub fn normalize_uri(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if has_uri_scheme(value) {
        return Some(value.to_string());
    }
    Some(file_uri(Path::new(value)))
}

fn has_uri_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn file_uri(path: &Path) -> String {
    let absolute: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| Path::new("/").join(path))
    };

    let mut uri = String::from("file://");
    for component in absolute.components() {
        if let Component::Normal(part) = component {
            uri.push('/');
            uri.push_str(&urlencoding::encode(&part.to_string_lossy()));
        }
    }
    if uri.len() == "file://".len() {
        uri.push('/');
    }
    uri
}
