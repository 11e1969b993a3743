//! Recording session state machine
//!
//! A session moves between `None`, `Recording`, `Paused` and `Interrupted`.
//! Interruptions stop the current segment; resuming opens a new one, and
//! stopping merges every segment back into a single file.

pub mod adapter;
pub mod meter;
pub mod options;
pub mod segmented;
pub mod status;

pub use adapter::{Callback, RecorderAdapter, RecorderCallbacks, VolumeCallback};
pub use options::RecordOptions;
pub use segmented::SegmentedRecorder;
pub use status::RecordingStatus;
