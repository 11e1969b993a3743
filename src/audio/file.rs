use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Media metadata for a recorded file
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub path: PathBuf,
    pub has_audio_track: bool,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Fully decoded audio file
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    /// Decode any container symphonia understands into interleaved i16 PCM
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Decoding audio file: {}", path.display());

        let mut format = open_format(path)?;
        let track = audio_track(format.as_ref())
            .cloned()
            .ok_or_else(|| anyhow!("No audio track in {}", path.display()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create decoder")?;

        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);
        let mut samples: Vec<i16> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e).context("Failed to read packet"),
            };
            if packet.track_id() != track.id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => return Err(e).context("Failed to decode packet"),
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count() as u16;

            let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        if sample_rate == 0 || channels == 0 {
            anyhow::bail!("Unknown audio format in {}", path.display());
        }

        let duration_seconds = samples.len() as f64 / (sample_rate as f64 * channels as f64);

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate,
            channels,
            samples,
        })
    }

    pub fn duration_ms(&self) -> u64 {
        (self.duration_seconds * 1000.0).round() as u64
    }
}

/// Read track presence and duration without decoding samples
pub fn probe(path: impl AsRef<Path>) -> Result<AssetInfo> {
    let path = path.as_ref();
    let format = open_format(path)?;

    let Some(track) = audio_track(format.as_ref()) else {
        return Ok(AssetInfo {
            path: path.to_path_buf(),
            has_audio_track: false,
            duration_ms: 0,
            sample_rate: 0,
            channels: 0,
        });
    };

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| anyhow!("Missing sample rate in {}", path.display()))?;
    let frames = params
        .n_frames
        .ok_or_else(|| anyhow!("Missing frame count in {}", path.display()))?;

    Ok(AssetInfo {
        path: path.to_path_buf(),
        has_audio_track: true,
        duration_ms: frames * 1000 / sample_rate as u64,
        sample_rate,
        channels: params.channels.map(|c| c.count() as u16).unwrap_or(1),
    })
}

/// Duration in milliseconds, or -1 when the file cannot be read
pub fn duration_ms(path: impl AsRef<Path>) -> i64 {
    let path = path.as_ref();
    match probe(path) {
        Ok(info) if info.has_audio_track => info.duration_ms as i64,
        Ok(_) => {
            warn!("No audio track in {}", path.display());
            -1
        }
        Err(e) => {
            warn!("Failed to read duration of {}: {:#}", path.display(), e);
            -1
        }
    }
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Unsupported audio container: {}", path.display()))?;

    Ok(probed.format)
}

fn audio_track(format: &dyn FormatReader) -> Option<&Track> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
}

/// Replays a decoded file as capture frames at real-time pace
pub struct FileBackend {
    config: AudioBackendConfig,
    path: PathBuf,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(config: AudioBackendConfig, path: PathBuf) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Audio file not found: {}", path.display());
        }
        Ok(Self {
            config,
            path,
            task: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            anyhow::bail!("Already capturing");
        }

        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .context("Decoder task panicked")??;

        if audio.sample_rate != self.config.target_sample_rate
            || audio.channels != self.config.target_channels
        {
            anyhow::bail!(
                "File format mismatch: expected {}Hz/{}ch, got {}Hz/{}ch",
                self.config.target_sample_rate,
                self.config.target_channels,
                audio.sample_rate,
                audio.channels
            );
        }

        info!(
            "Replaying {} ({:.1}s) as capture input",
            audio.path, audio.duration_seconds
        );

        let (tx, rx) = mpsc::channel(100);
        let buffer_ms = self.config.buffer_duration_ms;
        let chunk_len = self.config.samples_per_buffer().max(1);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(buffer_ms));
            let mut timestamp_ms = 0u64;
            for chunk in audio.samples.chunks(chunk_len) {
                ticker.tick().await;
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: audio.sample_rate,
                    channels: audio.channels,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += buffer_ms;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "File replay"
    }
}
