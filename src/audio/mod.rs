pub mod backend;
pub mod file;
pub mod signal;
pub mod writer;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, SILENCE_DB};
pub use file::{duration_ms, probe, AssetInfo, AudioFile, FileBackend};
pub use signal::{SignalBackend, SignalConfig};
pub use writer::{SegmentMetadata, SegmentWriter};
