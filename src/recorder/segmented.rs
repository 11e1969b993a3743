use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::adapter::{RecorderAdapter, RecorderCallbacks};
use super::meter::{VolumeSmoother, METER_INTERVAL};
use super::options::RecordOptions;
use super::status::RecordingStatus;
use crate::merge::merge_segments;
use crate::platform::{AudioSession, CaptureBackend, InterruptionEvent, RecorderHandle, SessionCategory};

/// Recording session that survives OS interruptions
///
/// Each resume after an interruption records into a fresh segment file; on
/// stop, multiple segments are merged back into the base file.
pub struct SegmentedRecorder {
    capture: Arc<dyn CaptureBackend>,
    options: RecordOptions,
    callbacks: RecorderCallbacks,
    state: Arc<Mutex<SessionState>>,
    interruption_listener: Option<InterruptionListener>,
}

/// Interruption subscription task plus its shutdown signal
struct InterruptionListener {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl InterruptionListener {
    /// Closes the subscription once any in-flight notification is handled
    async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Interruption listener panicked: {}", e);
            }
        }
    }
}

#[derive(Default)]
struct SessionState {
    status: RecordingStatus,
    audio_session: Option<Arc<dyn AudioSession>>,
    /// Category to restore once the session ends
    original_category: Option<SessionCategory>,
    /// Recorder for the newest segment
    recorder: Option<Box<dyn RecorderHandle>>,
    base_file: Option<PathBuf>,
    segments: Vec<PathBuf>,
    output_dir: PathBuf,
    meter: Option<JoinHandle<()>>,
}

impl SessionState {
    fn stop_metering(&mut self) {
        if let Some(meter) = self.meter.take() {
            meter.abort();
        }
    }
}

impl SegmentedRecorder {
    pub fn new(capture: Arc<dyn CaptureBackend>) -> Self {
        Self {
            capture,
            options: RecordOptions::default(),
            callbacks: RecorderCallbacks::default(),
            state: Arc::new(Mutex::new(SessionState::default())),
            interruption_listener: None,
        }
    }

    /// Segment files recorded so far, in capture order
    pub async fn segments(&self) -> Vec<PathBuf> {
        self.state.lock().await.segments.clone()
    }

    /// Applies an interruption notification directly
    pub async fn handle_interruption(&self, event: InterruptionEvent) {
        handle_interruption(&self.state, &self.callbacks, event).await;
    }

    fn output_directory(&self) -> Result<PathBuf> {
        let dir = match self.options.directory {
            Some(directory) => {
                let root = self
                    .capture
                    .directory_root(directory)
                    .with_context(|| format!("No location for {}", directory.as_str()))?;
                match self.options.sanitized_sub_directory() {
                    Some(sub) => root.join(sub),
                    None => root,
                }
            }
            None => self.capture.scratch_dir(),
        };

        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }
        Ok(dir)
    }

    async fn begin(&mut self) -> Result<()> {
        let session = self.capture.audio_session();
        let original_category = session.category();

        session
            .set_category(SessionCategory::PlayAndRecord)
            .context("Failed to set audio session category")?;

        let started = async {
            session.set_active(true).context("Failed to activate audio session")?;

            let output_dir = self.output_directory()?;
            let base_file = output_dir.join(format!(
                "recording-{}.{}",
                epoch_ms(),
                self.capture.native_extension()
            ));

            let mut recorder = self
                .capture
                .create_recorder(&base_file, &self.capture.encoding_settings())
                .context("Failed to create recorder")?;
            recorder.set_metering_enabled(true);

            let interruptions = session.interruptions();
            if !recorder.record().await {
                remove_quietly(&base_file);
                bail!("Recorder failed to start");
            }

            Ok::<_, anyhow::Error>((output_dir, base_file, recorder, interruptions))
        }
        .await;

        let (output_dir, base_file, recorder, interruptions) = match started {
            Ok(started) => started,
            Err(e) => {
                release_session(session.as_ref(), Some(original_category));
                return Err(e);
            }
        };

        {
            let mut st = self.state.lock().await;
            st.audio_session = Some(session);
            st.original_category = Some(original_category);
            st.recorder = Some(recorder);
            st.base_file = Some(base_file.clone());
            st.segments = vec![base_file.clone()];
            st.output_dir = output_dir;
            st.status = RecordingStatus::Recording;
            self.start_metering(&mut st);
        }

        self.interruption_listener = Some(self.listen_for_interruptions(interruptions));

        info!("Recording started: {}", base_file.display());
        Ok(())
    }

    fn listen_for_interruptions(&self, mut rx: broadcast::Receiver<InterruptionEvent>) -> InterruptionListener {
        let state = Arc::downgrade(&self.state);
        let callbacks = self.callbacks.clone();
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    received = rx.recv() => received,
                };
                match received {
                    Ok(event) => {
                        let Some(state) = state.upgrade() else {
                            break;
                        };
                        handle_interruption(&state, &callbacks, event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} interruption notifications", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        InterruptionListener { shutdown, task }
    }

    fn start_metering(&self, st: &mut SessionState) {
        st.stop_metering();
        if !self.options.volume_metering {
            return;
        }
        st.meter = Some(spawn_meter(Arc::downgrade(&self.state), self.callbacks.clone()));
    }
}

fn spawn_meter(state: Weak<Mutex<SessionState>>, callbacks: RecorderCallbacks) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(METER_INTERVAL);
        let mut smoother = VolumeSmoother::default();
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(state) = state.upgrade() else {
                break;
            };
            let power = {
                let mut st = state.lock().await;
                if st.status != RecordingStatus::Recording {
                    break;
                }
                match st.recorder.as_mut() {
                    Some(recorder) => recorder.average_power(),
                    None => break,
                }
            };
            drop(state);
            callbacks.volume_changed(smoother.push(power));
        }
    })
}

async fn handle_interruption(
    state: &Mutex<SessionState>,
    callbacks: &RecorderCallbacks,
    event: InterruptionEvent,
) {
    let mut st = state.lock().await;
    match (event, st.status) {
        (InterruptionEvent::Began, RecordingStatus::Recording) => {
            st.stop_metering();
            if let Some(recorder) = st.recorder.as_mut() {
                recorder.stop().await;
            }
            st.status = RecordingStatus::Interrupted;
            drop(st);
            info!("Recording interrupted");
            callbacks.interruption_began();
        }
        (InterruptionEvent::Ended, RecordingStatus::Interrupted) => {
            drop(st);
            info!("Interruption ended, waiting for resume");
            callbacks.interruption_ended();
        }
        (event, status) => debug!("Ignoring {:?} interruption while {}", event, status),
    }
}

fn release_session(session: &dyn AudioSession, original_category: Option<SessionCategory>) {
    if let Err(e) = session.set_active(false) {
        warn!("Failed to deactivate audio session: {:#}", e);
    }
    if let Some(category) = original_category {
        if let Err(e) = session.set_category(category) {
            warn!("Failed to restore audio session category: {:#}", e);
        }
    }
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait::async_trait]
impl RecorderAdapter for SegmentedRecorder {
    fn options(&self) -> &RecordOptions {
        &self.options
    }

    async fn start_recording(&mut self, options: RecordOptions, callbacks: RecorderCallbacks) -> bool {
        if self.state.lock().await.status.is_active() {
            warn!("Recording session already started");
            return false;
        }

        self.options = options;
        self.callbacks = callbacks;

        match self.begin().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to start recording: {:#}", e);
                false
            }
        }
    }

    async fn stop_recording(&mut self) -> bool {
        // A notification already being handled finishes before teardown
        if let Some(listener) = self.interruption_listener.take() {
            listener.shutdown().await;
        }

        let mut st = self.state.lock().await;
        if !st.status.is_active() {
            warn!("Stop requested without an active session");
            return false;
        }

        st.stop_metering();
        let was_interrupted = st.status == RecordingStatus::Interrupted;
        if let Some(mut recorder) = st.recorder.take() {
            if !was_interrupted {
                recorder.stop().await;
            }
        }

        let success = if st.segments.len() > 1 {
            let exporter = self.capture.exporter();
            let segments = st.segments.clone();
            let base_file = st.base_file.clone().unwrap_or_else(|| segments[0].clone());
            let work_dir = st.output_dir.clone();

            let merge = tokio::spawn(async move {
                merge_segments(exporter, &segments, &base_file, &work_dir).await
            });

            match merge.await {
                Ok(Ok(merged)) => {
                    st.base_file = Some(merged);
                    true
                }
                Ok(Err(e)) => {
                    error!("Failed to merge recording segments: {:#}", e);
                    false
                }
                Err(e) => {
                    error!("Merge task panicked: {}", e);
                    false
                }
            }
        } else {
            true
        };

        if let Some(session) = st.audio_session.take() {
            let original_category = st.original_category.take();
            release_session(session.as_ref(), original_category);
        }
        st.status = RecordingStatus::None;

        info!(
            "Recording stopped ({} segment(s), success={})",
            st.segments.len(),
            success
        );
        success
    }

    async fn pause_recording(&mut self) -> bool {
        let mut st = self.state.lock().await;
        if st.status != RecordingStatus::Recording {
            return false;
        }

        st.stop_metering();
        if let Some(recorder) = st.recorder.as_mut() {
            recorder.pause().await;
        }
        st.status = RecordingStatus::Paused;
        info!("Recording paused");
        true
    }

    async fn resume_recording(&mut self) -> bool {
        let mut st = self.state.lock().await;
        let was_interrupted = match st.status {
            RecordingStatus::Paused => false,
            RecordingStatus::Interrupted => true,
            _ => return false,
        };

        let Some(session) = st.audio_session.clone() else {
            return false;
        };

        if let Err(e) = session.set_active(true) {
            warn!("Failed to reactivate audio session: {:#}", e);
            if was_interrupted {
                if let Err(e) = session.set_active(false) {
                    warn!("Failed to deactivate audio session: {:#}", e);
                }
            }
            return false;
        }

        if was_interrupted {
            let segment_path = st.output_dir.join(format!(
                "recording-{}-segment-{}.{}",
                epoch_ms(),
                st.segments.len(),
                self.capture.native_extension()
            ));

            let mut recorder = match self
                .capture
                .create_recorder(&segment_path, &self.capture.encoding_settings())
            {
                Ok(recorder) => recorder,
                Err(e) => {
                    error!("Failed to open segment {}: {:#}", segment_path.display(), e);
                    release_session(session.as_ref(), None);
                    return false;
                }
            };

            recorder.set_metering_enabled(true);
            if !recorder.record().await {
                error!("Recorder failed to start segment {}", segment_path.display());
                drop(recorder);
                remove_quietly(&segment_path);
                release_session(session.as_ref(), None);
                return false;
            }

            info!("Recording resumed into segment {}", segment_path.display());
            st.recorder = Some(recorder);
            st.segments.push(segment_path);
        } else {
            let Some(recorder) = st.recorder.as_mut() else {
                return false;
            };
            recorder.set_metering_enabled(true);
            if !recorder.record().await {
                error!("Recorder failed to resume");
                return false;
            }
            info!("Recording resumed");
        }

        self.start_metering(&mut st);
        st.status = RecordingStatus::Recording;
        true
    }

    async fn current_status(&self) -> RecordingStatus {
        self.state.lock().await.status
    }

    async fn output_file(&self) -> Option<PathBuf> {
        self.state.lock().await.base_file.clone()
    }
}

impl Drop for SegmentedRecorder {
    fn drop(&mut self) {
        if let Some(listener) = self.interruption_listener.take() {
            listener.task.abort();
        }
        if let Ok(mut st) = self.state.try_lock() {
            st.stop_metering();
        }
    }
}
