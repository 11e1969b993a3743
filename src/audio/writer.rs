use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::backend::AudioFrame;

/// Metadata for a finished segment file
#[derive(Debug, Clone)]
pub struct SegmentMetadata {
    /// File path of the segment
    pub file_path: PathBuf,
    /// Sample rate
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Number of samples written (all channels)
    pub sample_count: usize,
}

impl SegmentMetadata {
    pub fn duration_ms(&self) -> u64 {
        let frames = self.sample_count as u64 / self.channels.max(1) as u64;
        frames * 1000 / self.sample_rate.max(1) as u64
    }
}

/// Writes a single segment to disk as a 16-bit WAV file
pub struct SegmentWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    metadata: SegmentMetadata,
}

impl SegmentWriter {
    pub fn create(file_path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&file_path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", file_path))?;

        Ok(Self {
            writer: Some(writer),
            metadata: SegmentMetadata {
                file_path,
                sample_rate,
                channels,
                sample_count: 0,
            },
        })
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        self.write_samples(&frame.samples)
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.metadata.sample_count += samples.len();
        }

        Ok(())
    }

    pub fn metadata(&self) -> &SegmentMetadata {
        &self.metadata
    }

    pub fn finish(mut self) -> Result<SegmentMetadata> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        Ok(self.metadata.clone())
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
