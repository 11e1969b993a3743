pub mod audio;
pub mod bridge;
pub mod config;
pub mod contract;
pub mod http;
pub mod merge;
pub mod platform;
pub mod recorder;
pub mod service;

pub use audio::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource};
pub use bridge::{BridgeEvent, Rejection, VoiceRecorderBridge};
pub use config::Config;
pub use contract::{ErrorCode, RecordData, ResponseFormat, ServiceError};
pub use http::{create_router, AppState};
pub use merge::{merge_segments, SegmentExporter, WavExporter};
pub use platform::{CaptureBackend, DesktopPlatform, Directory, RecorderPlatform};
pub use recorder::{RecordOptions, RecorderAdapter, RecorderCallbacks, RecordingStatus, SegmentedRecorder};
pub use service::VoiceRecorderService;
