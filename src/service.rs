//! Recording service: precondition checks around a single active session

use anyhow::anyhow;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::contract::{mime_type_for_extension, ErrorCode, RecordData, ServiceError, ServiceResult};
use crate::platform::{CaptureBackend, RecorderPlatform};
use crate::recorder::{RecordOptions, RecorderAdapter, RecorderCallbacks, RecordingStatus, SegmentedRecorder};

/// Builds a fresh session adapter for each recording
pub type AdapterFactory = Arc<dyn Fn() -> Box<dyn RecorderAdapter> + Send + Sync>;

/// Reports whether recording permission is currently granted
pub type PermissionChecker = Arc<dyn Fn() -> bool + Send + Sync>;

/// Owns at most one active recording session
///
/// Every call takes `&mut self`, so a stop that is still merging holds the
/// service until the session has been cleared.
pub struct VoiceRecorderService {
    platform: Arc<dyn RecorderPlatform>,
    adapters: AdapterFactory,
    permission_checker: PermissionChecker,
    recorder: Option<Box<dyn RecorderAdapter>>,
}

impl VoiceRecorderService {
    pub fn new(
        platform: Arc<dyn RecorderPlatform>,
        adapters: AdapterFactory,
        permission_checker: PermissionChecker,
    ) -> Self {
        Self {
            platform,
            adapters,
            permission_checker,
            recorder: None,
        }
    }

    /// Service whose sessions are `SegmentedRecorder`s on `capture`
    pub fn with_capture(
        platform: Arc<dyn RecorderPlatform>,
        capture: Arc<dyn CaptureBackend>,
        permission_checker: PermissionChecker,
    ) -> Self {
        let adapters: AdapterFactory =
            Arc::new(move || Box::new(SegmentedRecorder::new(Arc::clone(&capture))) as Box<dyn RecorderAdapter>);
        Self::new(platform, adapters, permission_checker)
    }

    pub fn can_device_voice_record(&self) -> bool {
        self.platform.can_device_voice_record()
    }

    pub fn has_audio_recording_permission(&self) -> bool {
        (self.permission_checker)()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub async fn start_recording(
        &mut self,
        options: RecordOptions,
        callbacks: RecorderCallbacks,
    ) -> ServiceResult<()> {
        if !self.can_device_voice_record() {
            return Err(ErrorCode::DeviceCannotVoiceRecord.into());
        }
        if !self.has_audio_recording_permission() {
            return Err(ErrorCode::MissingPermission.into());
        }
        if self.platform.is_microphone_occupied() {
            return Err(ErrorCode::MicrophoneBeingUsed.into());
        }
        if self.recorder.is_some() {
            return Err(ErrorCode::AlreadyRecording.into());
        }

        let mut recorder = (self.adapters)();
        if !recorder.start_recording(options, callbacks).await {
            return Err(ErrorCode::DeviceCannotVoiceRecord.into());
        }

        self.recorder = Some(recorder);
        Ok(())
    }

    pub async fn stop_recording(&mut self) -> ServiceResult<RecordData> {
        let Some(mut recorder) = self.recorder.take() else {
            return Err(ErrorCode::RecordingHasNotStarted.into());
        };

        if !recorder.stop_recording().await {
            return Err(ErrorCode::FailedToMergeRecording.into());
        }

        let Some(output) = recorder.output_file().await else {
            return Err(ServiceError::with_source(
                ErrorCode::FailedToFetchRecording,
                anyhow!("session finished without an output file"),
            ));
        };

        let send_base64 = recorder.options().sends_base64();
        let (record_data_base64, uri) = if send_base64 {
            (self.platform.read_file_as_base64(&output), None)
        } else {
            (None, Some(self.platform.to_uri(&output)))
        };

        let ms_duration = self.platform.duration_ms(&output);

        if send_base64 {
            remove_scratch_file(&output);
        }

        if (send_base64 && record_data_base64.is_none()) || ms_duration < 0 {
            return Err(ErrorCode::EmptyRecording.into());
        }

        let extension = output
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        info!("Recording finished: {} ({} ms)", output.display(), ms_duration);

        Ok(RecordData {
            record_data_base64,
            ms_duration,
            mime_type: mime_type_for_extension(extension).to_string(),
            uri,
        })
    }

    pub async fn pause_recording(&mut self) -> ServiceResult<bool> {
        let recorder = self.active_recorder()?;
        Ok(recorder.pause_recording().await)
    }

    pub async fn resume_recording(&mut self) -> ServiceResult<bool> {
        let recorder = self.active_recorder()?;
        Ok(recorder.resume_recording().await)
    }

    pub async fn current_status(&self) -> RecordingStatus {
        match &self.recorder {
            Some(recorder) => recorder.current_status().await,
            None => RecordingStatus::None,
        }
    }

    fn active_recorder(&mut self) -> ServiceResult<&mut Box<dyn RecorderAdapter>> {
        let supports_pause_resume = self.platform.supports_pause_resume();
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| ServiceError::new(ErrorCode::RecordingHasNotStarted))?;
        if !supports_pause_resume {
            return Err(ErrorCode::NotSupportedOsVersion.into());
        }
        Ok(recorder)
    }
}

fn remove_scratch_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove scratch recording {}: {}", path.display(), e);
    }
}
