use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordingStatus {
    Recording,
    Paused,
    /// Capture stopped by the OS; resuming opens a new segment
    Interrupted,
    /// No session, or the session has stopped
    #[default]
    None,
}

impl RecordingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "RECORDING",
            Self::Paused => "PAUSED",
            Self::Interrupted => "INTERRUPTED",
            Self::None => "NONE",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
