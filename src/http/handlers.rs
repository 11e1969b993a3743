use super::state::AppState;
use crate::bridge::BridgeResult;
use crate::recorder::RecordOptions;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Rejections become 400 with the rejection body
fn respond(result: BridgeResult) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(rejection) => (StatusCode::BAD_REQUEST, Json(rejection)).into_response(),
    }
}

/// POST /canDeviceVoiceRecord
pub async fn can_device_voice_record(State(state): State<AppState>) -> Response {
    Json(state.bridge.can_device_voice_record().await).into_response()
}

/// POST /requestAudioRecordingPermission
pub async fn request_audio_recording_permission(State(state): State<AppState>) -> Response {
    respond(state.bridge.request_audio_recording_permission().await)
}

/// POST /hasAudioRecordingPermission
pub async fn has_audio_recording_permission(State(state): State<AppState>) -> Response {
    Json(state.bridge.has_audio_recording_permission().await).into_response()
}

/// POST /startRecording
///
/// An empty body means default options; a body that does not parse is rejected.
pub async fn start_recording(State(state): State<AppState>, body: Bytes) -> Response {
    let options = if body.iter().all(u8::is_ascii_whitespace) {
        RecordOptions::default()
    } else {
        match serde_json::from_slice::<RecordOptions>(&body) {
            Ok(options) => options,
            Err(e) => return respond(Err(state.bridge.reject_options(e))),
        }
    };
    info!("Start requested: {:?}", options);
    respond(state.bridge.start_recording(options).await)
}

/// POST /stopRecording
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    info!("Stop requested");
    respond(state.bridge.stop_recording().await)
}

/// POST /pauseRecording
pub async fn pause_recording(State(state): State<AppState>) -> Response {
    respond(state.bridge.pause_recording().await)
}

/// POST /resumeRecording
pub async fn resume_recording(State(state): State<AppState>) -> Response {
    respond(state.bridge.resume_recording().await)
}

/// POST /getCurrentStatus
pub async fn get_current_status(State(state): State<AppState>) -> Response {
    Json(state.bridge.get_current_status().await).into_response()
}

/// GET /events
/// Bridge events as server-sent events
pub async fn events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bridge.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let mut sse = Event::default().event(event.name());
                    if let Some(data) = event.data() {
                        sse = sse.data(data.to_string());
                    }
                    return Some((Ok(sse), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, dropped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
