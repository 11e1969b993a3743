// Generated-tone backend standing in for a microphone on desktop targets

use anyhow::{bail, Result};
use std::f32::consts::TAU;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Tone parameters for the signal backend
#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub frequency_hz: f32,
    /// Peak amplitude, 0.0 - 1.0
    pub amplitude: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            amplitude: 0.25,
        }
    }
}

/// Emits one sine-wave frame per buffer period
pub struct SignalBackend {
    config: AudioBackendConfig,
    signal: SignalConfig,
    task: Option<JoinHandle<()>>,
}

impl SignalBackend {
    pub fn new(config: AudioBackendConfig, signal: SignalConfig) -> Self {
        Self {
            config,
            signal,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for SignalBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(100);
        let config = self.config.clone();
        let signal = self.signal.clone();

        info!(
            "Starting signal capture ({}Hz tone, {}Hz, {} channels)",
            signal.frequency_hz, config.target_sample_rate, config.target_channels
        );

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(config.buffer_duration_ms));
            let frames_per_buffer = config.samples_per_buffer() / config.target_channels.max(1) as usize;
            let amplitude = signal.amplitude.clamp(0.0, 1.0) * i16::MAX as f32;
            let step = TAU * signal.frequency_hz / config.target_sample_rate as f32;
            let mut phase = 0.0f32;
            let mut timestamp_ms = 0u64;

            loop {
                ticker.tick().await;

                let mut samples = Vec::with_capacity(frames_per_buffer * config.target_channels as usize);
                for _ in 0..frames_per_buffer {
                    let sample = (phase.sin() * amplitude) as i16;
                    for _ in 0..config.target_channels {
                        samples.push(sample);
                    }
                    phase = (phase + step) % TAU;
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate: config.target_sample_rate,
                    channels: config.target_channels,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += config.buffer_duration_ms;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Signal capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "Signal generator"
    }
}
