use anyhow::Result;
use directories::{ProjectDirs, UserDirs};
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::{AudioSource, SignalConfig};
use crate::contract::{resolve_response_format, ResponseFormat};
use crate::platform::{Directory, EncodingSettings};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub plugin: PluginConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub audio: AudioConfig,
    pub permission: PermissionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Raw value; resolved through `resolve_response_format`
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

/// Roots for each logical storage location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub documents: PathBuf,
    pub data: PathBuf,
    pub library: PathBuf,
    pub cache: PathBuf,
    pub external: PathBuf,
    pub external_storage: PathBuf,
    /// Scratch space for recordings returned inline
    pub temp: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let fallback = std::env::temp_dir().join("voice-recorder");
        let project = ProjectDirs::from("dev", "voice-recorder", "voice-recorder");
        let documents = UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|d| d.to_path_buf()))
            .unwrap_or_else(|| fallback.join("documents"));

        let (data, library, cache) = match &project {
            Some(dirs) => (
                dirs.data_dir().to_path_buf(),
                dirs.data_local_dir().join("library"),
                dirs.cache_dir().to_path_buf(),
            ),
            None => (
                fallback.join("data"),
                fallback.join("library"),
                fallback.join("cache"),
            ),
        };

        Self {
            documents,
            external: data.join("external"),
            external_storage: UserDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .unwrap_or_else(|| fallback.join("external-storage")),
            data,
            library,
            cache,
            temp: fallback.join("tmp"),
        }
    }
}

impl StorageConfig {
    /// Every location rooted under one directory (tests, sandboxes)
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            documents: root.join("documents"),
            data: root.join("data"),
            library: root.join("library"),
            cache: root.join("cache"),
            external: root.join("external"),
            external_storage: root.join("external-storage"),
            temp: root.join("tmp"),
        }
    }

    pub fn root_of(&self, directory: Directory) -> PathBuf {
        match directory {
            Directory::Documents => self.documents.clone(),
            Directory::Data => self.data.clone(),
            Directory::Library => self.library.clone(),
            Directory::Cache => self.cache.clone(),
            Directory::External => self.external.clone(),
            Directory::ExternalStorage => self.external_storage.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Capture buffer size; also the metering resolution
    pub buffer_duration_ms: u64,
    /// Frequency of the generated input tone
    pub tone_hz: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            buffer_duration_ms: 20,
            tone_hz: 440.0,
        }
    }
}

impl AudioConfig {
    pub fn encoding_settings(&self) -> EncodingSettings {
        EncodingSettings {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Built-in tone input at the configured frequency
    pub fn signal_source(&self) -> AudioSource {
        AudioSource::Signal(SignalConfig {
            frequency_hz: self.tone_hz,
            ..SignalConfig::default()
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    pub granted: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self { granted: true }
    }
}

impl Config {
    /// Load layered configuration: optional file, then `VOICE_RECORDER__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("VOICE_RECORDER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn response_format(&self) -> ResponseFormat {
        resolve_response_format(self.plugin.response_format.as_ref())
    }
}
