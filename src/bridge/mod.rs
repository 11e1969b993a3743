//! Host-facing facade over the recording service
//!
//! Wraps every result in the `{value}` / `{status}` shapes, turns service
//! errors into rejections according to the configured response format, and
//! forwards session callbacks as `BridgeEvent`s.

pub mod events;
pub mod permission;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub use events::BridgeEvent;
pub use permission::{ConfiguredPermission, PermissionRequester};

use crate::audio::AudioSource;
use crate::config::Config;
use crate::contract::{
    data_response, from_boolean, status_response, success_response, to_canonical_error_code, ErrorCode,
    ResponseFormat, ServiceError,
};
use crate::platform::DesktopPlatform;
use crate::recorder::{RecordOptions, RecorderCallbacks, RecordingStatus};
use crate::service::VoiceRecorderService;

const EVENT_CAPACITY: usize = 256;

/// Error handed back to the host for a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct Rejection {
    /// Legacy message or canonical code, depending on the response format
    pub message: String,
    /// Canonical error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<String>,
}

impl Rejection {
    pub fn from_error(error: &ServiceError, format: ResponseFormat) -> Self {
        let legacy = error.code.legacy_message();
        let message = match format {
            ResponseFormat::Legacy => legacy.to_string(),
            ResponseFormat::Normalized => to_canonical_error_code(legacy),
        };
        Self {
            message,
            code: error.code.as_str().to_string(),
            underlying: error.underlying.as_ref().map(|e| format!("{:#}", e)),
        }
    }
}

pub type BridgeResult = Result<Value, Rejection>;

pub struct VoiceRecorderBridge {
    service: Option<Mutex<VoiceRecorderService>>,
    response_format: ResponseFormat,
    permission_requester: Arc<dyn PermissionRequester>,
    events: broadcast::Sender<BridgeEvent>,
}

impl VoiceRecorderBridge {
    pub fn new(
        service: Option<VoiceRecorderService>,
        response_format: ResponseFormat,
        permission_requester: Arc<dyn PermissionRequester>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!("Voice recorder bridge ready (response format: {:?})", response_format);
        Self {
            service: service.map(Mutex::new),
            response_format,
            permission_requester,
            events,
        }
    }

    /// Bridge over the desktop provider described by `config`
    ///
    /// The platform is returned as well so hosts can forward interruptions
    /// through its audio session.
    pub fn desktop(config: &Config, source: AudioSource) -> (Self, Arc<DesktopPlatform>) {
        let platform = Arc::new(DesktopPlatform::new(
            config.storage.clone(),
            config.audio.clone(),
            source,
        ));
        let permission = ConfiguredPermission::new(config.permission.granted);
        let service = VoiceRecorderService::with_capture(
            platform.clone(),
            platform.clone(),
            permission.checker(),
        );
        let bridge = Self::new(Some(service), config.response_format(), permission);
        (bridge, platform)
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub async fn can_device_voice_record(&self) -> Value {
        match &self.service {
            Some(service) => from_boolean(service.lock().await.can_device_voice_record()),
            None => from_boolean(false),
        }
    }

    pub async fn request_audio_recording_permission(&self) -> BridgeResult {
        match self.permission_requester.request_permission().await {
            Ok(granted) => Ok(from_boolean(granted)),
            Err(e) => Err(self.reject(ServiceError::with_source(
                ErrorCode::CouldNotQueryPermissionStatus,
                e,
            ))),
        }
    }

    pub async fn has_audio_recording_permission(&self) -> Value {
        match &self.service {
            Some(service) => from_boolean(service.lock().await.has_audio_recording_permission()),
            None => from_boolean(false),
        }
    }

    pub async fn start_recording(&self, options: RecordOptions) -> BridgeResult {
        let Some(service) = &self.service else {
            return Err(self.reject(ErrorCode::FailedToRecord.into()));
        };

        let began = self.events.clone();
        let ended = self.events.clone();
        let volume = self.events.clone();
        let mut callbacks = RecorderCallbacks::default()
            .on_interruption_began(move || {
                let _ = began.send(BridgeEvent::InterruptionBegan);
            })
            .on_interruption_ended(move || {
                let _ = ended.send(BridgeEvent::InterruptionEnded);
            });
        if options.volume_metering {
            callbacks = callbacks.on_volume_changed(move |level| {
                let _ = volume.send(BridgeEvent::VolumeChanged(level));
            });
        }

        service
            .lock()
            .await
            .start_recording(options, callbacks)
            .await
            .map(|()| success_response())
            .map_err(|e| self.reject(e))
    }

    pub async fn stop_recording(&self) -> BridgeResult {
        let Some(service) = &self.service else {
            return Err(self.reject(ErrorCode::FailedToFetchRecording.into()));
        };

        let record = service
            .lock()
            .await
            .stop_recording()
            .await
            .map_err(|e| self.reject(e))?;
        Ok(data_response(record.to_payload(self.response_format)))
    }

    pub async fn pause_recording(&self) -> BridgeResult {
        let Some(service) = &self.service else {
            return Err(self.reject(ErrorCode::RecordingHasNotStarted.into()));
        };

        service
            .lock()
            .await
            .pause_recording()
            .await
            .map(from_boolean)
            .map_err(|e| self.reject(e))
    }

    pub async fn resume_recording(&self) -> BridgeResult {
        let Some(service) = &self.service else {
            return Err(self.reject(ErrorCode::RecordingHasNotStarted.into()));
        };

        service
            .lock()
            .await
            .resume_recording()
            .await
            .map(from_boolean)
            .map_err(|e| self.reject(e))
    }

    pub async fn get_current_status(&self) -> Value {
        let status = match &self.service {
            Some(service) => service.lock().await.current_status().await,
            None => RecordingStatus::None,
        };
        status_response(status)
    }

    /// Rejection for start options the host sent but that do not parse
    pub fn reject_options(&self, error: impl Into<anyhow::Error>) -> Rejection {
        let underlying = error.into().context("Invalid recording options");
        self.reject(ServiceError::with_source(ErrorCode::FailedToRecord, underlying))
    }

    fn reject(&self, error: ServiceError) -> Rejection {
        let rejection = Rejection::from_error(&error, self.response_format);
        match &rejection.underlying {
            Some(underlying) => warn!("Rejecting call with {}: {}", rejection.code, underlying),
            None => warn!("Rejecting call with {}", rejection.code),
        }
        rejection
    }
}
