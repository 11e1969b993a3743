use serde::{Deserialize, Serialize};

use crate::platform::Directory;

/// Caller-supplied recording options, fixed once a session starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOptions {
    /// Logical location for the output file; inline base64 when absent
    #[serde(default)]
    pub directory: Option<Directory>,
    #[serde(default)]
    pub sub_directory: Option<String>,
    #[serde(default)]
    pub volume_metering: bool,
}

impl RecordOptions {
    /// Subdirectory with leading/trailing slashes removed; `None` when empty.
    pub fn sanitized_sub_directory(&self) -> Option<&str> {
        self.sub_directory
            .as_deref()
            .map(|sub| sub.trim_matches('/'))
            .filter(|sub| !sub.is_empty())
    }

    /// Payloads are inline base64 unless a directory was requested.
    pub fn sends_base64(&self) -> bool {
        self.directory.is_none()
    }
}
