use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::options::RecordOptions;
use super::status::RecordingStatus;

pub type Callback = Arc<dyn Fn() + Send + Sync>;
pub type VolumeCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Notifications a session delivers back to its owner
#[derive(Clone, Default)]
pub struct RecorderCallbacks {
    pub on_interruption_began: Option<Callback>,
    pub on_interruption_ended: Option<Callback>,
    pub on_volume_changed: Option<VolumeCallback>,
}

impl RecorderCallbacks {
    pub fn on_interruption_began(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_interruption_began = Some(Arc::new(f));
        self
    }

    pub fn on_interruption_ended(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_interruption_ended = Some(Arc::new(f));
        self
    }

    pub fn on_volume_changed(mut self, f: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.on_volume_changed = Some(Arc::new(f));
        self
    }

    pub(crate) fn interruption_began(&self) {
        if let Some(cb) = &self.on_interruption_began {
            cb();
        }
    }

    pub(crate) fn interruption_ended(&self) {
        if let Some(cb) = &self.on_interruption_ended {
            cb();
        }
    }

    pub(crate) fn volume_changed(&self, volume: f32) {
        if let Some(cb) = &self.on_volume_changed {
            cb(volume);
        }
    }
}

impl fmt::Debug for RecorderCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderCallbacks")
            .field("on_interruption_began", &self.on_interruption_began.is_some())
            .field("on_interruption_ended", &self.on_interruption_ended.is_some())
            .field("on_volume_changed", &self.on_volume_changed.is_some())
            .finish()
    }
}

/// One recording attempt, from start to stop
///
/// An adapter is single-use: once `stop_recording` completes, a new one must
/// be constructed for the next recording.
#[async_trait::async_trait]
pub trait RecorderAdapter: Send + Sync {
    /// Options the session was started with.
    fn options(&self) -> &RecordOptions;

    /// Acquires the device and begins capture. Never errors; `false` leaves
    /// the adapter in `None`.
    async fn start_recording(&mut self, options: RecordOptions, callbacks: RecorderCallbacks) -> bool;

    /// Stops capture, merging segments when needed. Resolves once the
    /// session has reached `None`; `false` means the merge failed.
    async fn stop_recording(&mut self) -> bool;

    async fn pause_recording(&mut self) -> bool;

    async fn resume_recording(&mut self) -> bool;

    async fn current_status(&self) -> RecordingStatus;

    /// File exposed as the session output.
    async fn output_file(&self) -> Option<PathBuf>;
}
