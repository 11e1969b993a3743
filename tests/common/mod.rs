// Shared test doubles for the recorder, service and bridge tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use base64::Engine;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use voice_recorder::audio::{self, AssetInfo};
use voice_recorder::bridge::PermissionRequester;
use voice_recorder::merge::{Composition, SegmentExporter, WavExporter};
use voice_recorder::platform::{
    AudioSession, CaptureBackend, Directory, EncodingSettings, InterruptionEvent, RecorderHandle,
    RecorderPlatform, SessionCategory,
};

pub const TEST_SAMPLE_RATE: u32 = 8000;

/// Writes `duration_ms` of a quiet square wave as a mono 16-bit WAV
pub fn write_wav(path: &Path, duration_ms: u64) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = duration_ms * TEST_SAMPLE_RATE as u64 / 1000;
    for i in 0..frames {
        let sample: i16 = if (i / 20) % 2 == 0 { 2000 } else { -2000 };
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Polls `check` until it holds or two seconds pass
pub async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Audio session whose interruptions and failures are driven by the test
pub struct ScriptedSession {
    category: Mutex<SessionCategory>,
    active: AtomicBool,
    pub fail_activate: AtomicBool,
    interruptions: broadcast::Sender<InterruptionEvent>,
}

impl ScriptedSession {
    pub fn new() -> Arc<Self> {
        let (interruptions, _) = broadcast::channel(16);
        Arc::new(Self {
            category: Mutex::new(SessionCategory::Ambient),
            active: AtomicBool::new(false),
            fail_activate: AtomicBool::new(false),
            interruptions,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn interrupt(&self) {
        let _ = self.interruptions.send(InterruptionEvent::Began);
    }

    pub fn end_interruption(&self) {
        let _ = self.interruptions.send(InterruptionEvent::Ended);
    }
}

impl AudioSession for ScriptedSession {
    fn category(&self) -> SessionCategory {
        *self.category.lock().unwrap()
    }

    fn set_category(&self, category: SessionCategory) -> Result<()> {
        *self.category.lock().unwrap() = category;
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<()> {
        if active && self.fail_activate.load(Ordering::SeqCst) {
            bail!("simulated activation failure");
        }
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    fn interruptions(&self) -> broadcast::Receiver<InterruptionEvent> {
        self.interruptions.subscribe()
    }
}

/// Recorder that writes a fixed-length WAV when stopped
pub struct FakeRecorder {
    path: PathBuf,
    segment_ms: u64,
    /// Time spent finalizing, after the recorder already counts as stopped
    stop_delay_ms: u64,
    record_result: bool,
    recording: bool,
    metering: bool,
    stopped: bool,
}

#[async_trait::async_trait]
impl RecorderHandle for FakeRecorder {
    async fn record(&mut self) -> bool {
        if self.stopped || !self.record_result {
            return false;
        }
        self.recording = true;
        true
    }

    async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.recording = false;
        if self.stop_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.stop_delay_ms)).await;
        }
        write_wav(&self.path, self.segment_ms).unwrap();
    }

    async fn pause(&mut self) {
        self.recording = false;
    }

    fn set_metering_enabled(&mut self, enabled: bool) {
        self.metering = enabled;
    }

    fn average_power(&mut self) -> f32 {
        if self.metering && self.recording {
            -20.0
        } else {
            -160.0
        }
    }
}

/// Capture backend rooted in a temp dir
pub struct FakeCapture {
    pub root: TempDir,
    pub session: Arc<ScriptedSession>,
    pub segment_ms: u64,
    pub stop_delay_ms: AtomicU64,
    pub fail_create: AtomicBool,
    pub record_result: AtomicBool,
    exporter: Arc<dyn SegmentExporter>,
}

impl FakeCapture {
    pub fn new() -> Arc<Self> {
        Self::with_exporter(Arc::new(WavExporter))
    }

    pub fn with_exporter(exporter: Arc<dyn SegmentExporter>) -> Arc<Self> {
        Arc::new(Self {
            root: TempDir::new().unwrap(),
            session: ScriptedSession::new(),
            segment_ms: 400,
            stop_delay_ms: AtomicU64::new(0),
            fail_create: AtomicBool::new(false),
            record_result: AtomicBool::new(true),
            exporter,
        })
    }

    pub fn failing_export() -> Arc<Self> {
        Self::with_exporter(Arc::new(FailingExporter))
    }
}

impl CaptureBackend for FakeCapture {
    fn audio_session(&self) -> Arc<dyn AudioSession> {
        self.session.clone()
    }

    fn create_recorder(&self, path: &Path, _settings: &EncodingSettings) -> Result<Box<dyn RecorderHandle>> {
        if self.fail_create.load(Ordering::SeqCst) {
            bail!("simulated recorder acquisition failure");
        }
        Ok(Box::new(FakeRecorder {
            path: path.to_path_buf(),
            segment_ms: self.segment_ms,
            stop_delay_ms: self.stop_delay_ms.load(Ordering::SeqCst),
            record_result: self.record_result.load(Ordering::SeqCst),
            recording: false,
            metering: false,
            stopped: false,
        }))
    }

    fn encoding_settings(&self) -> EncodingSettings {
        EncodingSettings {
            sample_rate: TEST_SAMPLE_RATE,
            channels: 1,
        }
    }

    fn native_extension(&self) -> &str {
        "wav"
    }

    fn directory_root(&self, directory: Directory) -> Option<PathBuf> {
        Some(self.root.path().join(directory.as_str().to_lowercase()))
    }

    fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    fn exporter(&self) -> Arc<dyn SegmentExporter> {
        self.exporter.clone()
    }
}

/// Loads segments normally but never produces an export
pub struct FailingExporter;

#[async_trait::async_trait]
impl SegmentExporter for FailingExporter {
    fn output_extension(&self) -> &str {
        "wav"
    }

    async fn load_asset(&self, path: &Path) -> Result<AssetInfo> {
        WavExporter.load_asset(path).await
    }

    async fn export(&self, _composition: &Composition, _output: &Path) -> Result<()> {
        bail!("simulated export failure")
    }
}

/// Platform answers controlled by the test
pub struct FakePlatform {
    pub can_record: AtomicBool,
    pub microphone_occupied: AtomicBool,
    pub pause_supported: AtomicBool,
    /// Overrides the probed duration when set
    pub duration_override: Mutex<Option<i64>>,
    pub last_duration_ms: AtomicI64,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            can_record: AtomicBool::new(true),
            microphone_occupied: AtomicBool::new(false),
            pause_supported: AtomicBool::new(true),
            duration_override: Mutex::new(None),
            last_duration_ms: AtomicI64::new(0),
        })
    }
}

impl RecorderPlatform for FakePlatform {
    fn can_device_voice_record(&self) -> bool {
        self.can_record.load(Ordering::SeqCst)
    }

    fn is_microphone_occupied(&self) -> bool {
        self.microphone_occupied.load(Ordering::SeqCst)
    }

    fn supports_pause_resume(&self) -> bool {
        self.pause_supported.load(Ordering::SeqCst)
    }

    fn read_file_as_base64(&self, path: &Path) -> Option<String> {
        std::fs::read(path)
            .ok()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    fn duration_ms(&self, path: &Path) -> i64 {
        let duration = self
            .duration_override
            .lock()
            .unwrap()
            .unwrap_or_else(|| audio::duration_ms(path));
        self.last_duration_ms.store(duration, Ordering::SeqCst);
        duration
    }
}

/// Permission prompt that cannot be shown
pub struct BrokenPermissionPrompt;

#[async_trait::async_trait]
impl PermissionRequester for BrokenPermissionPrompt {
    async fn request_permission(&self) -> Result<bool> {
        bail!("permission service unavailable")
    }
}
