// Desktop capability provider: WAV segments fed by an AudioBackend

use anyhow::{Context, Result};
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{
    AudioSession, CaptureBackend, Directory, EncodingSettings, InterruptionEvent, RecorderHandle,
    RecorderPlatform, SessionCategory,
};
use crate::audio::{
    self, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioSource, SegmentWriter, SILENCE_DB,
};
use crate::config::{AudioConfig, StorageConfig};
use crate::merge::{SegmentExporter, WavExporter};

/// Audio session for desktop targets
///
/// Desktop OSes have no interruption notifications of their own; `interrupt()`
/// and `end_interruption()` let a host forward them (device lost, call started).
pub struct DesktopAudioSession {
    category: AtomicU8,
    active: AtomicBool,
    interruptions: broadcast::Sender<InterruptionEvent>,
}

impl DesktopAudioSession {
    pub fn new() -> Self {
        let (interruptions, _) = broadcast::channel(16);
        Self {
            category: AtomicU8::new(category_to_u8(SessionCategory::SoloAmbient)),
            active: AtomicBool::new(false),
            interruptions,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn interrupt(&self) {
        info!("Audio session interruption began");
        let _ = self.interruptions.send(InterruptionEvent::Began);
    }

    pub fn end_interruption(&self) {
        info!("Audio session interruption ended");
        let _ = self.interruptions.send(InterruptionEvent::Ended);
    }
}

impl Default for DesktopAudioSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSession for DesktopAudioSession {
    fn category(&self) -> SessionCategory {
        category_from_u8(self.category.load(Ordering::SeqCst))
    }

    fn set_category(&self, category: SessionCategory) -> Result<()> {
        self.category.store(category_to_u8(category), Ordering::SeqCst);
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<()> {
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    fn interruptions(&self) -> broadcast::Receiver<InterruptionEvent> {
        self.interruptions.subscribe()
    }
}

fn category_to_u8(category: SessionCategory) -> u8 {
    match category {
        SessionCategory::Ambient => 0,
        SessionCategory::SoloAmbient => 1,
        SessionCategory::Playback => 2,
        SessionCategory::Record => 3,
        SessionCategory::PlayAndRecord => 4,
    }
}

fn category_from_u8(value: u8) -> SessionCategory {
    match value {
        0 => SessionCategory::Ambient,
        2 => SessionCategory::Playback,
        3 => SessionCategory::Record,
        4 => SessionCategory::PlayAndRecord,
        _ => SessionCategory::SoloAmbient,
    }
}

/// Recorder writing backend frames into one WAV segment
pub struct WavRecorder {
    path: PathBuf,
    backend: Box<dyn AudioBackend>,
    writer: Option<SegmentWriter>,
    pump: Option<JoinHandle<SegmentWriter>>,
    paused: Arc<AtomicBool>,
    level_db: Arc<AtomicU32>,
    metering: bool,
    stopped: bool,
}

impl WavRecorder {
    pub fn create(path: &Path, settings: &EncodingSettings, backend: Box<dyn AudioBackend>) -> Result<Self> {
        let writer = SegmentWriter::create(path, settings.sample_rate, settings.channels)?;
        Ok(Self {
            path: path.to_path_buf(),
            backend,
            writer: Some(writer),
            pump: None,
            paused: Arc::new(AtomicBool::new(false)),
            level_db: Arc::new(AtomicU32::new(SILENCE_DB.to_bits())),
            metering: false,
            stopped: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl RecorderHandle for WavRecorder {
    async fn record(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.paused.store(false, Ordering::SeqCst);
        if self.pump.is_some() {
            return true;
        }

        let Some(mut writer) = self.writer.take() else {
            return false;
        };

        let mut frames = match self.backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start {} for {}: {:#}", self.backend.name(), self.path.display(), e);
                self.writer = Some(writer);
                return false;
            }
        };

        let paused = Arc::clone(&self.paused);
        let level_db = Arc::clone(&self.level_db);
        let path = self.path.clone();

        self.pump = Some(tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if paused.load(Ordering::SeqCst) {
                    continue;
                }
                level_db.store(frame.level_db().to_bits(), Ordering::SeqCst);
                if let Err(e) = writer.write_frame(&frame) {
                    error!("Failed to write frame to {}: {:#}", path.display(), e);
                    break;
                }
            }
            writer
        }));

        info!("Recording into {} ({})", self.path.display(), self.backend.name());
        true
    }

    async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.level_db.store(SILENCE_DB.to_bits(), Ordering::SeqCst);

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop {}: {:#}", self.backend.name(), e);
        }

        // The pump handle stays put until joined so an interrupted stop can finish later
        let writer = match self.pump.as_mut() {
            Some(pump) => {
                let joined = pump.await;
                self.pump = None;
                match joined {
                    Ok(writer) => Some(writer),
                    Err(e) => {
                        error!("Recorder pump panicked: {}", e);
                        None
                    }
                }
            }
            None => self.writer.take(),
        };

        if let Some(writer) = writer {
            match writer.finish() {
                Ok(meta) => info!(
                    "Segment finalized: {} ({} ms)",
                    meta.file_path.display(),
                    meta.duration_ms()
                ),
                Err(e) => error!("Failed to finalize {}: {:#}", self.path.display(), e),
            }
        }
        self.stopped = true;
    }

    async fn pause(&mut self) {
        self.paused.store(true, Ordering::SeqCst);
        self.level_db.store(SILENCE_DB.to_bits(), Ordering::SeqCst);
    }

    fn set_metering_enabled(&mut self, enabled: bool) {
        self.metering = enabled;
    }

    fn average_power(&mut self) -> f32 {
        if !self.metering {
            return SILENCE_DB;
        }
        f32::from_bits(self.level_db.load(Ordering::SeqCst))
    }
}

/// Capability provider for desktop hosts
pub struct DesktopPlatform {
    storage: StorageConfig,
    audio: AudioConfig,
    source: AudioSource,
    session: Arc<DesktopAudioSession>,
    exporter: Arc<WavExporter>,
}

impl DesktopPlatform {
    pub fn new(storage: StorageConfig, audio: AudioConfig, source: AudioSource) -> Self {
        Self {
            storage,
            audio,
            source,
            session: Arc::new(DesktopAudioSession::new()),
            exporter: Arc::new(WavExporter),
        }
    }

    /// Concrete session handle, for forwarding host interruptions
    pub fn session(&self) -> Arc<DesktopAudioSession> {
        Arc::clone(&self.session)
    }
}

impl RecorderPlatform for DesktopPlatform {
    fn can_device_voice_record(&self) -> bool {
        AudioBackendFactory::create(&self.source, self.backend_config()).is_ok()
    }

    fn read_file_as_base64(&self, path: &Path) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn to_uri(&self, path: &Path) -> String {
        std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string()
    }

    fn duration_ms(&self, path: &Path) -> i64 {
        audio::duration_ms(path)
    }
}

impl DesktopPlatform {
    fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.audio.sample_rate,
            target_channels: self.audio.channels,
            buffer_duration_ms: self.audio.buffer_duration_ms,
        }
    }
}

impl CaptureBackend for DesktopPlatform {
    fn audio_session(&self) -> Arc<dyn AudioSession> {
        self.session.clone()
    }

    fn create_recorder(&self, path: &Path, settings: &EncodingSettings) -> Result<Box<dyn RecorderHandle>> {
        let config = AudioBackendConfig {
            target_sample_rate: settings.sample_rate,
            target_channels: settings.channels,
            buffer_duration_ms: self.audio.buffer_duration_ms,
        };
        let backend = AudioBackendFactory::create(&self.source, config)
            .context("Failed to create audio backend")?;
        let recorder = WavRecorder::create(path, settings, backend)?;
        Ok(Box::new(recorder))
    }

    fn encoding_settings(&self) -> EncodingSettings {
        self.audio.encoding_settings()
    }

    fn native_extension(&self) -> &str {
        "wav"
    }

    fn directory_root(&self, directory: Directory) -> Option<PathBuf> {
        Some(self.storage.root_of(directory))
    }

    fn scratch_dir(&self) -> PathBuf {
        self.storage.temp.clone()
    }

    fn exporter(&self) -> Arc<dyn SegmentExporter> {
        self.exporter.clone()
    }
}
