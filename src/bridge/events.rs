use serde_json::{json, Value};

/// Notification pushed to the host while a session runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeEvent {
    InterruptionBegan,
    InterruptionEnded,
    VolumeChanged(f32),
}

impl BridgeEvent {
    /// Host-facing event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::InterruptionBegan => "voiceRecordingInterrupted",
            Self::InterruptionEnded => "voiceRecordingInterruptionEnded",
            Self::VolumeChanged(_) => "volumeChanged",
        }
    }

    /// Event payload; interruption events carry none.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::VolumeChanged(volume) => Some(json!({ "volume": volume })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_volume_carries_a_payload() {
        assert_eq!(BridgeEvent::InterruptionBegan.name(), "voiceRecordingInterrupted");
        assert_eq!(BridgeEvent::InterruptionEnded.name(), "voiceRecordingInterruptionEnded");
        assert!(BridgeEvent::InterruptionBegan.data().is_none());

        let volume = BridgeEvent::VolumeChanged(0.5);
        assert_eq!(volume.name(), "volumeChanged");
        assert_eq!(volume.data(), Some(json!({ "volume": 0.5 })));
    }
}
