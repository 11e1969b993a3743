use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Capability and permission
        .route("/canDeviceVoiceRecord", post(handlers::can_device_voice_record))
        .route(
            "/requestAudioRecordingPermission",
            post(handlers::request_audio_recording_permission),
        )
        .route(
            "/hasAudioRecordingPermission",
            post(handlers::has_audio_recording_permission),
        )
        // Recording control
        .route("/startRecording", post(handlers::start_recording))
        .route("/stopRecording", post(handlers::stop_recording))
        .route("/pauseRecording", post(handlers::pause_recording))
        .route("/resumeRecording", post(handlers::resume_recording))
        .route("/getCurrentStatus", post(handlers::get_current_status))
        // Session notifications
        .route("/events", get(handlers::events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
