//! Segment merge engine
//!
//! Concatenates the segments of an interrupted session into a single file:
//! load every segment concurrently, lay their audio back-to-back in a
//! composition, export it to a temp file, then swap it in for the base file.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audio::{self, AssetInfo, AudioFile, SegmentWriter};

/// One source placed on the composition timeline
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionClip {
    pub source: PathBuf,
    pub insert_at_ms: u64,
    pub duration_ms: u64,
}

/// Single audio track built from consecutive clips
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub clips: Vec<CompositionClip>,
}

impl Composition {
    /// Places each asset's full track directly after the previous one.
    pub fn concatenate(assets: &[AssetInfo]) -> Self {
        let mut insert_at_ms = 0;
        let clips = assets
            .iter()
            .map(|asset| {
                let clip = CompositionClip {
                    source: asset.path.clone(),
                    insert_at_ms,
                    duration_ms: asset.duration_ms,
                };
                insert_at_ms += asset.duration_ms;
                clip
            })
            .collect();
        Self { clips }
    }

    pub fn duration_ms(&self) -> u64 {
        self.clips
            .iter()
            .map(|clip| clip.insert_at_ms + clip.duration_ms)
            .max()
            .unwrap_or(0)
    }
}

/// Loads segment metadata and renders compositions to disk.
#[async_trait::async_trait]
pub trait SegmentExporter: Send + Sync {
    /// Extension of exported files, without the dot.
    fn output_extension(&self) -> &str;

    async fn load_asset(&self, path: &Path) -> Result<AssetInfo>;

    async fn export(&self, composition: &Composition, output: &Path) -> Result<()>;
}

/// Exports compositions as 16-bit WAV
///
/// Every clip must share the first clip's sample rate and channel count.
pub struct WavExporter;

#[async_trait::async_trait]
impl SegmentExporter for WavExporter {
    fn output_extension(&self) -> &str {
        "wav"
    }

    async fn load_asset(&self, path: &Path) -> Result<AssetInfo> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || audio::probe(path))
            .await
            .context("Asset loader panicked")?
    }

    async fn export(&self, composition: &Composition, output: &Path) -> Result<()> {
        let composition = composition.clone();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || render_wav(&composition, &output))
            .await
            .context("Export task panicked")?
    }
}

fn render_wav(composition: &Composition, output: &Path) -> Result<()> {
    let mut clips: Vec<&CompositionClip> = composition.clips.iter().collect();
    clips.sort_by_key(|clip| clip.insert_at_ms);

    let decoded = clips
        .iter()
        .map(|clip| AudioFile::open(&clip.source))
        .collect::<Result<Vec<_>>>()?;
    let first = decoded.first().ok_or_else(|| anyhow!("Nothing to export"))?;
    let (sample_rate, channels) = (first.sample_rate, first.channels);

    let mut writer = SegmentWriter::create(output, sample_rate, channels)?;
    let mut cursor_frames: u64 = 0;

    for (clip, audio) in clips.iter().zip(&decoded) {
        if audio.sample_rate != sample_rate || audio.channels != channels {
            bail!(
                "Segment format mismatch in {}: {}Hz/{}ch, expected {}Hz/{}ch",
                clip.source.display(),
                audio.sample_rate,
                audio.channels,
                sample_rate,
                channels
            );
        }

        let start_frame = clip.insert_at_ms * sample_rate as u64 / 1000;
        if start_frame > cursor_frames {
            let gap = ((start_frame - cursor_frames) * channels as u64) as usize;
            writer.write_samples(&vec![0i16; gap])?;
            cursor_frames = start_frame;
        }

        writer.write_samples(&audio.samples)?;
        cursor_frames += audio.samples.len() as u64 / channels.max(1) as u64;
        debug!("Appended {} to {}", clip.source.display(), output.display());
    }

    writer.finish()?;
    Ok(())
}

/// Merges `segments` into one file next to `base_file`.
///
/// Returns the merged path: `base_file` with the exporter's extension. On any
/// failure the temp export is removed and the segments are left in place.
pub async fn merge_segments(
    exporter: Arc<dyn SegmentExporter>,
    segments: &[PathBuf],
    base_file: &Path,
    work_dir: &Path,
) -> Result<PathBuf> {
    if segments.len() <= 1 {
        return Ok(base_file.to_path_buf());
    }

    info!("Merging {} segments into {}", segments.len(), base_file.display());

    let loads = segments.iter().map(|segment| exporter.load_asset(segment));
    let mut assets = Vec::with_capacity(segments.len());
    for (segment, loaded) in segments.iter().zip(futures::future::join_all(loads).await) {
        let asset = loaded.with_context(|| format!("Failed to load segment {}", segment.display()))?;
        if !asset.has_audio_track {
            bail!("Segment {} has no audio track", segment.display());
        }
        assets.push(asset);
    }

    let composition = Composition::concatenate(&assets);
    let extension = exporter.output_extension().to_string();
    let temp_path = work_dir.join(format!(
        "temp-merged-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        extension
    ));

    match finish_merge(exporter.as_ref(), &composition, &temp_path, segments, base_file, &extension).await {
        Ok(merged) => {
            info!(
                "Merged recording ready: {} ({} ms)",
                merged.display(),
                composition.duration_ms()
            );
            Ok(merged)
        }
        Err(e) => {
            if temp_path.exists() {
                if let Err(cleanup) = std::fs::remove_file(&temp_path) {
                    warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

async fn finish_merge(
    exporter: &dyn SegmentExporter,
    composition: &Composition,
    temp_path: &Path,
    segments: &[PathBuf],
    base_file: &Path,
    extension: &str,
) -> Result<PathBuf> {
    exporter
        .export(composition, temp_path)
        .await
        .context("Export did not complete")?;

    if !temp_path.exists() {
        bail!("Export finished without producing {}", temp_path.display());
    }

    let merged_path = base_file.with_extension(extension);
    if merged_path.exists() {
        std::fs::remove_file(&merged_path)
            .with_context(|| format!("Failed to replace {}", merged_path.display()))?;
    }
    std::fs::rename(temp_path, &merged_path)
        .with_context(|| format!("Failed to move merged file to {}", merged_path.display()))?;

    for segment in segments {
        if segment != &merged_path && segment.exists() {
            if let Err(e) = std::fs::remove_file(segment) {
                warn!("Failed to delete segment {}: {}", segment.display(), e);
            }
        }
    }

    Ok(merged_path)
}
