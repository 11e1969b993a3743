// Unit and integration tests for the desktop audio primitives
//
// These tests verify frames, the generated-tone backend, segment writing
// and probing of the resulting files.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use voice_recorder::audio::{
    self, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource, SegmentWriter,
    SignalBackend, SignalConfig, SILENCE_DB,
};

#[test]
fn test_audio_frame_level() {
    let silent = AudioFrame {
        samples: vec![0; 160],
        sample_rate: 8000,
        channels: 1,
        timestamp_ms: 0,
    };
    assert_eq!(silent.level_db(), SILENCE_DB);

    let full_scale = AudioFrame {
        samples: vec![i16::MAX; 160],
        ..silent.clone()
    };
    assert!(full_scale.level_db().abs() < 0.01, "Full scale should be ~0 dBFS");

    // Half amplitude is about -6 dBFS
    let half = AudioFrame {
        samples: vec![i16::MAX / 2; 160],
        ..silent
    };
    assert!((half.level_db() + 6.02).abs() < 0.1);
}

#[test]
fn test_audio_frame_empty_is_silent() {
    let frame = AudioFrame {
        samples: Vec::new(),
        sample_rate: 44100,
        channels: 2,
        timestamp_ms: 0,
    };
    assert_eq!(frame.level_db(), SILENCE_DB);
}

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 44100, "Default should match the native encoders");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 20);
    assert_eq!(config.samples_per_buffer(), 882);
}

#[test]
fn test_samples_per_buffer_counts_all_channels() {
    let config = AudioBackendConfig {
        target_sample_rate: 48000,
        target_channels: 2,
        buffer_duration_ms: 10,
    };
    assert_eq!(config.samples_per_buffer(), 960);
}

#[tokio::test]
async fn test_signal_backend_emits_frames_until_stopped() -> Result<()> {
    let config = AudioBackendConfig {
        target_sample_rate: 8000,
        target_channels: 1,
        buffer_duration_ms: 10,
    };
    let mut backend = SignalBackend::new(config, SignalConfig::default());

    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());
    assert!(backend.start().await.is_err(), "Second start should fail");

    let first = rx.recv().await.expect("frame");
    let second = rx.recv().await.expect("frame");
    assert_eq!(first.samples.len(), 80);
    assert_eq!(first.sample_rate, 8000);
    assert_eq!(second.timestamp_ms, 10);
    assert!(first.level_db() > SILENCE_DB);

    backend.stop().await?;
    assert!(!backend.is_capturing());

    // Channel closes once the generator is gone
    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
    Ok(())
}

#[test]
fn test_factory_rejects_missing_file() {
    let source = AudioSource::File(PathBuf::from("/nonexistent/path/to/audio.wav"));
    assert!(AudioBackendFactory::create(&source, AudioBackendConfig::default()).is_err());
    assert!(AudioBackendFactory::create(&AudioSource::default(), AudioBackendConfig::default()).is_ok());
}

#[test]
fn test_segment_writer_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("segment.wav");

    let mut writer = SegmentWriter::create(&path, 16000, 1)?;
    writer.write_frame(&AudioFrame {
        samples: vec![1000; 16000],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    })?;
    writer.write_samples(&[500; 8000])?;
    assert_eq!(writer.metadata().sample_count, 24000);

    let meta = writer.finish()?;
    assert_eq!(meta.duration_ms(), 1500);

    let info = audio::probe(&path)?;
    assert!(info.has_audio_track);
    assert_eq!(info.duration_ms, 1500);
    assert_eq!(info.sample_rate, 16000);
    assert_eq!(audio::duration_ms(&path), 1500);

    let decoded = AudioFile::open(&path)?;
    assert_eq!(decoded.samples.len(), 24000);
    assert_eq!(decoded.channels, 1);
    assert_eq!(decoded.duration_ms(), 1500);
    Ok(())
}

#[test]
fn test_segment_writer_finalizes_on_drop() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("dropped.wav");

    {
        let mut writer = SegmentWriter::create(&path, 8000, 2)?;
        writer.write_samples(&[0; 1600])?;
    }

    // 800 stereo frames at 8kHz
    assert_eq!(audio::duration_ms(&path), 100);
    Ok(())
}

#[test]
fn test_duration_of_unreadable_files_is_negative() -> Result<()> {
    let dir = TempDir::new()?;
    let garbage = dir.path().join("garbage.wav");
    std::fs::write(&garbage, b"definitely not audio")?;

    assert_eq!(audio::duration_ms(&garbage), -1);
    assert_eq!(audio::duration_ms(dir.path().join("missing.wav")), -1);
    assert!(AudioFile::open(dir.path().join("missing.wav")).is_err());
    Ok(())
}
