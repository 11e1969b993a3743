use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Historical message for devices that cannot record.
pub const CANNOT_RECORD_ON_THIS_PHONE: &str = "CANNOT_RECORD_ON_THIS_PHONE";

/// Canonical error codes returned to callers.
///
/// The string form (SCREAMING_SNAKE_CASE) is the stable contract. Legacy
/// messages are derived from these codes, never the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingPermission,
    AlreadyRecording,
    MicrophoneBeingUsed,
    DeviceCannotVoiceRecord,
    FailedToRecord,
    EmptyRecording,
    RecordingHasNotStarted,
    FailedToFetchRecording,
    FailedToMergeRecording,
    NotSupportedOsVersion,
    CouldNotQueryPermissionStatus,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::MissingPermission,
        ErrorCode::AlreadyRecording,
        ErrorCode::MicrophoneBeingUsed,
        ErrorCode::DeviceCannotVoiceRecord,
        ErrorCode::FailedToRecord,
        ErrorCode::EmptyRecording,
        ErrorCode::RecordingHasNotStarted,
        ErrorCode::FailedToFetchRecording,
        ErrorCode::FailedToMergeRecording,
        ErrorCode::NotSupportedOsVersion,
        ErrorCode::CouldNotQueryPermissionStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPermission => "MISSING_PERMISSION",
            Self::AlreadyRecording => "ALREADY_RECORDING",
            Self::MicrophoneBeingUsed => "MICROPHONE_BEING_USED",
            Self::DeviceCannotVoiceRecord => "DEVICE_CANNOT_VOICE_RECORD",
            Self::FailedToRecord => "FAILED_TO_RECORD",
            Self::EmptyRecording => "EMPTY_RECORDING",
            Self::RecordingHasNotStarted => "RECORDING_HAS_NOT_STARTED",
            Self::FailedToFetchRecording => "FAILED_TO_FETCH_RECORDING",
            Self::FailedToMergeRecording => "FAILED_TO_MERGE_RECORDING",
            Self::NotSupportedOsVersion => "NOT_SUPPORTED_OS_VERSION",
            Self::CouldNotQueryPermissionStatus => "COULD_NOT_QUERY_PERMISSION_STATUS",
        }
    }

    /// Message presented to callers running in legacy response mode.
    pub fn legacy_message(&self) -> &'static str {
        match self {
            Self::DeviceCannotVoiceRecord => CANNOT_RECORD_ON_THIS_PHONE,
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// Maps a legacy message onto its canonical code.
///
/// Messages that are not a known alias pass through unchanged, so canonical
/// codes map to themselves.
pub fn to_canonical_error_code(message: &str) -> String {
    match message {
        CANNOT_RECORD_ON_THIS_PHONE => ErrorCode::DeviceCannotVoiceRecord.as_str().to_string(),
        other => other.to_string(),
    }
}

/// Error surfaced by the recording service.
#[derive(Debug, Error)]
#[error("{code}")]
pub struct ServiceError {
    pub code: ErrorCode,
    #[source]
    pub underlying: Option<anyhow::Error>,
}

impl ServiceError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            underlying: None,
        }
    }

    pub fn with_source(code: ErrorCode, underlying: anyhow::Error) -> Self {
        Self {
            code,
            underlying: Some(underlying),
        }
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
