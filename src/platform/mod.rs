//! Platform capability providers
//!
//! The recording core never touches a device directly. Each target supplies:
//! - a `RecorderPlatform` for capability checks, file reads and duration lookup
//! - a `CaptureBackend` for the audio session, recorder handles, storage
//!   locations and the segment exporter used when merging
//!
//! Providers are chosen when the service is composed; nothing is global.

pub mod desktop;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::merge::SegmentExporter;

pub use desktop::{DesktopAudioSession, DesktopPlatform, WavRecorder};

/// Capability queries and file access used by the service.
pub trait RecorderPlatform: Send + Sync {
    fn can_device_voice_record(&self) -> bool;

    /// Whether another client currently holds the microphone.
    fn is_microphone_occupied(&self) -> bool {
        false
    }

    /// Whether the recorder can pause and resume on this OS version.
    fn supports_pause_resume(&self) -> bool {
        true
    }

    /// Reads the file as base64, returning `None` on failure.
    fn read_file_as_base64(&self, path: &Path) -> Option<String>;

    /// Location reported to callers for file-backed payloads.
    fn to_uri(&self, path: &Path) -> String {
        path.display().to_string()
    }

    /// Duration in milliseconds, negative on failure.
    fn duration_ms(&self, path: &Path) -> i64;
}

/// Audio session category, mirrored from mobile audio session APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionCategory {
    Ambient,
    SoloAmbient,
    Playback,
    Record,
    PlayAndRecord,
}

/// OS-level interruption notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionEvent {
    Began,
    Ended,
}

/// Process-wide audio session handle.
pub trait AudioSession: Send + Sync {
    fn category(&self) -> SessionCategory;
    fn set_category(&self, category: SessionCategory) -> Result<()>;
    fn set_active(&self, active: bool) -> Result<()>;
    /// Subscribes to interruption notifications. Dropping the receiver unsubscribes.
    fn interruptions(&self) -> broadcast::Receiver<InterruptionEvent>;
}

/// Encoder settings shared by every segment of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingSettings {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
        }
    }
}

/// A native recorder bound to one output file.
#[async_trait::async_trait]
pub trait RecorderHandle: Send {
    /// Begins or continues capture into the file.
    async fn record(&mut self) -> bool;
    /// Stops capture and finalizes the file. Safe to call twice.
    async fn stop(&mut self);
    async fn pause(&mut self);
    fn set_metering_enabled(&mut self, enabled: bool);
    /// Instantaneous average power in dBFS (-160 .. 0).
    fn average_power(&mut self) -> f32;
}

/// Logical storage locations a caller may ask recordings to land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Directory {
    Documents,
    Data,
    Library,
    Cache,
    External,
    ExternalStorage,
}

impl Directory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documents => "DOCUMENTS",
            Self::Data => "DATA",
            Self::Library => "LIBRARY",
            Self::Cache => "CACHE",
            Self::External => "EXTERNAL",
            Self::ExternalStorage => "EXTERNAL_STORAGE",
        }
    }

    /// Unrecognised names fall back to `Documents`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "DATA" => Self::Data,
            "LIBRARY" => Self::Library,
            "CACHE" => Self::Cache,
            "EXTERNAL" => Self::External,
            "EXTERNAL_STORAGE" => Self::ExternalStorage,
            _ => Self::Documents,
        }
    }
}

impl From<String> for Directory {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Directory> for String {
    fn from(directory: Directory) -> Self {
        directory.as_str().to_string()
    }
}

/// Device side of a recording session.
pub trait CaptureBackend: Send + Sync {
    fn audio_session(&self) -> Arc<dyn AudioSession>;

    /// Opens a recorder writing to `path`. Fails on acquisition errors.
    fn create_recorder(&self, path: &Path, settings: &EncodingSettings) -> Result<Box<dyn RecorderHandle>>;

    fn encoding_settings(&self) -> EncodingSettings;

    /// Container extension produced by the recorder, without the dot.
    fn native_extension(&self) -> &str;

    /// Root directory of a logical location, if the platform has one.
    fn directory_root(&self, directory: Directory) -> Option<PathBuf>;

    /// Scratch location for recordings that are returned inline.
    fn scratch_dir(&self) -> PathBuf;

    fn exporter(&self) -> Arc<dyn SegmentExporter>;
}
