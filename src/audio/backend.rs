use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::file::FileBackend;
use super::signal::{SignalBackend, SignalConfig};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// RMS level of the frame in dBFS, floored at -160.
    pub fn level_db(&self) -> f32 {
        if self.samples.is_empty() {
            return SILENCE_DB;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let v = s as f64 / i16::MAX as f64;
                v * v
            })
            .sum();
        let rms = (sum / self.samples.len() as f64).sqrt();
        if rms <= 0.0 {
            return SILENCE_DB;
        }
        ((20.0 * rms.log10()) as f32).max(SILENCE_DB)
    }
}

/// Level reported for silence or a stopped recorder.
pub const SILENCE_DB: f32 = -160.0;

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate delivered to the recorder
    pub target_sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency and metering granularity)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            target_channels: 1,
            buffer_duration_ms: 20,
        }
    }
}

impl AudioBackendConfig {
    pub fn samples_per_buffer(&self) -> usize {
        (self.target_sample_rate as u64 * self.buffer_duration_ms / 1000) as usize
            * self.target_channels as usize
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Signal: generated tone (desktop default, demos and tests)
/// - File: replay a recorded file at real-time pace
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes once the backend is stopped.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend based on source and configuration
    pub fn create(source: &AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Signal(signal) => Ok(Box::new(SignalBackend::new(config, signal.clone()))),
            AudioSource::File(path) => Ok(Box::new(FileBackend::new(config, path.clone())?)),
        }
    }
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Generated tone
    Signal(SignalConfig),
    /// File input (replayed in real time)
    File(PathBuf),
}

impl Default for AudioSource {
    fn default() -> Self {
        Self::Signal(SignalConfig::default())
    }
}
