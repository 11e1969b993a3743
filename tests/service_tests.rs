// Integration tests for the recording service
//
// These tests check the precondition order and the stop payload built from
// the finished session.

mod common;

use anyhow::Result;
use common::{wait_for, FakeCapture, FakePlatform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use voice_recorder::platform::Directory;
use voice_recorder::recorder::{RecordOptions, RecorderCallbacks, RecordingStatus};
use voice_recorder::service::VoiceRecorderService;
use voice_recorder::ErrorCode;

struct Fixture {
    platform: Arc<FakePlatform>,
    capture: Arc<FakeCapture>,
    permission: Arc<AtomicBool>,
    service: VoiceRecorderService,
}

fn fixture_with(capture: Arc<FakeCapture>) -> Fixture {
    let platform = FakePlatform::new();
    let permission = Arc::new(AtomicBool::new(true));
    let checker = {
        let permission = permission.clone();
        Arc::new(move || permission.load(Ordering::SeqCst))
    };
    let service = VoiceRecorderService::with_capture(platform.clone(), capture.clone(), checker);
    Fixture {
        platform,
        capture,
        permission,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with(FakeCapture::new())
}

fn cache_options() -> RecordOptions {
    RecordOptions {
        directory: Some(Directory::Cache),
        sub_directory: Some("voice-tests/".to_string()),
        volume_metering: false,
    }
}

async fn start(fx: &mut Fixture, options: RecordOptions) -> Result<(), ErrorCode> {
    fx.service
        .start_recording(options, RecorderCallbacks::default())
        .await
        .map_err(|e| e.code)
}

#[tokio::test]
async fn test_start_checks_capability_first() {
    let mut fx = fixture();
    fx.platform.can_record.store(false, Ordering::SeqCst);
    fx.permission.store(false, Ordering::SeqCst);

    assert_eq!(
        start(&mut fx, RecordOptions::default()).await,
        Err(ErrorCode::DeviceCannotVoiceRecord)
    );
    assert!(!fx.service.can_device_voice_record());
}

#[tokio::test]
async fn test_start_requires_permission() {
    let mut fx = fixture();
    fx.permission.store(false, Ordering::SeqCst);

    assert!(!fx.service.has_audio_recording_permission());
    assert_eq!(
        start(&mut fx, RecordOptions::default()).await,
        Err(ErrorCode::MissingPermission)
    );
    assert_eq!(fx.service.current_status().await, RecordingStatus::None);
}

#[tokio::test]
async fn test_start_fails_when_microphone_is_busy() {
    let mut fx = fixture();
    fx.platform.microphone_occupied.store(true, Ordering::SeqCst);

    assert_eq!(
        start(&mut fx, RecordOptions::default()).await,
        Err(ErrorCode::MicrophoneBeingUsed)
    );
}

#[tokio::test]
async fn test_second_start_is_rejected_without_touching_session() -> Result<()> {
    let mut fx = fixture();
    start(&mut fx, RecordOptions::default()).await.unwrap();
    assert!(fx.service.pause_recording().await?);

    assert_eq!(start(&mut fx, cache_options()).await, Err(ErrorCode::AlreadyRecording));
    assert_eq!(fx.service.current_status().await, RecordingStatus::Paused);

    fx.service.stop_recording().await?;
    Ok(())
}

#[tokio::test]
async fn test_adapter_start_failure_maps_to_device_error() {
    let mut fx = fixture();
    fx.capture.record_result.store(false, Ordering::SeqCst);

    assert_eq!(
        start(&mut fx, RecordOptions::default()).await,
        Err(ErrorCode::DeviceCannotVoiceRecord)
    );
    assert!(!fx.service.is_recording());
    assert_eq!(fx.service.current_status().await, RecordingStatus::None);
}

#[tokio::test]
async fn test_calls_without_session_fail_not_started() {
    let mut fx = fixture();

    assert_eq!(
        fx.service.stop_recording().await.unwrap_err().code,
        ErrorCode::RecordingHasNotStarted
    );
    assert_eq!(
        fx.service.pause_recording().await.unwrap_err().code,
        ErrorCode::RecordingHasNotStarted
    );
    assert_eq!(
        fx.service.resume_recording().await.unwrap_err().code,
        ErrorCode::RecordingHasNotStarted
    );
    assert_eq!(fx.service.current_status().await, RecordingStatus::None);
}

#[tokio::test]
async fn test_pause_resume_unsupported_os() {
    let mut fx = fixture();
    fx.platform.pause_supported.store(false, Ordering::SeqCst);

    // Not-started wins over unsupported
    assert_eq!(
        fx.service.pause_recording().await.unwrap_err().code,
        ErrorCode::RecordingHasNotStarted
    );

    start(&mut fx, RecordOptions::default()).await.unwrap();
    assert_eq!(
        fx.service.pause_recording().await.unwrap_err().code,
        ErrorCode::NotSupportedOsVersion
    );
    assert_eq!(
        fx.service.resume_recording().await.unwrap_err().code,
        ErrorCode::NotSupportedOsVersion
    );
}

#[tokio::test]
async fn test_stop_returns_inline_base64_and_removes_scratch_file() -> Result<()> {
    let mut fx = fixture();
    start(&mut fx, RecordOptions::default()).await.unwrap();

    let record = fx.service.stop_recording().await?;
    assert!(record.record_data_base64.as_deref().is_some_and(|data| !data.is_empty()));
    assert!(record.uri.is_none());
    assert_eq!(record.mime_type, "audio/wav");
    assert_eq!(record.ms_duration, 400);

    let scratch: Vec<_> = std::fs::read_dir(fx.capture.root.path().join("tmp"))?.collect();
    assert!(scratch.is_empty(), "scratch recording should be removed");
    assert!(!fx.service.is_recording());
    Ok(())
}

#[tokio::test]
async fn test_stop_returns_uri_for_directory_recordings() -> Result<()> {
    let mut fx = fixture();
    start(&mut fx, cache_options()).await.unwrap();

    let record = fx.service.stop_recording().await?;
    assert!(record.record_data_base64.is_none());
    let uri = record.uri.expect("uri");
    let expected_dir = fx.capture.root.path().join("cache").join("voice-tests");
    assert!(uri.starts_with(&expected_dir.display().to_string()), "uri {}", uri);
    assert!(uri.ends_with(".wav"));
    assert!(std::path::Path::new(&uri).exists());
    Ok(())
}

#[tokio::test]
async fn test_negative_duration_is_an_empty_recording() -> Result<()> {
    let mut fx = fixture();
    *fx.platform.duration_override.lock().unwrap() = Some(-1);
    start(&mut fx, cache_options()).await.unwrap();

    assert_eq!(
        fx.service.stop_recording().await.unwrap_err().code,
        ErrorCode::EmptyRecording
    );

    // Session discarded regardless
    assert_eq!(fx.service.current_status().await, RecordingStatus::None);
    start(&mut fx, RecordOptions::default()).await.unwrap();
    Ok(())
}

#[tokio::test]
async fn test_interrupted_session_merges_on_stop() -> Result<()> {
    let mut fx = fixture();
    start(&mut fx, cache_options()).await.unwrap();

    fx.capture.session.interrupt();
    let service = &fx.service;
    assert!(wait_for(|| async { service.current_status().await == RecordingStatus::Interrupted }).await);
    fx.capture.session.end_interruption();
    assert!(fx.service.resume_recording().await?);

    let record = fx.service.stop_recording().await?;
    assert!((790..=810).contains(&record.ms_duration), "duration {}", record.ms_duration);
    Ok(())
}

#[tokio::test]
async fn test_failed_merge_discards_session() -> Result<()> {
    let mut fx = fixture_with(FakeCapture::failing_export());
    start(&mut fx, RecordOptions::default()).await.unwrap();

    fx.capture.session.interrupt();
    let service = &fx.service;
    assert!(wait_for(|| async { service.current_status().await == RecordingStatus::Interrupted }).await);
    assert!(fx.service.resume_recording().await?);

    assert_eq!(
        fx.service.stop_recording().await.unwrap_err().code,
        ErrorCode::FailedToMergeRecording
    );
    assert!(!fx.service.is_recording());

    // Next start goes through
    start(&mut fx, RecordOptions::default()).await.unwrap();
    assert_eq!(fx.service.current_status().await, RecordingStatus::Recording);
    Ok(())
}
