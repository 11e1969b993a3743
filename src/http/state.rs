use std::sync::Arc;

use crate::bridge::VoiceRecorderBridge;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<VoiceRecorderBridge>,
}

impl AppState {
    pub fn new(bridge: Arc<VoiceRecorderBridge>) -> Self {
        Self { bridge }
    }
}
