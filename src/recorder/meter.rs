// Volume metering curve and smoothing

use std::time::Duration;

/// Sampling period of the level timer
pub const METER_INTERVAL: Duration = Duration::from_millis(50);

const THRESHOLD: f32 = 0.15;
const KNEE: f32 = 0.8;

/// Converts dBFS to a linear 0..1 amplitude
pub fn power_to_linear(power_db: f32) -> f32 {
    10f32.powf(power_db / 20.0).clamp(0.0, 1.0)
}

/// Perceptual level: square-root boost below the threshold, linear above the knee
pub fn visual_level(raw_linear: f32) -> f32 {
    let raw = raw_linear.clamp(0.0, 1.0);
    if raw <= THRESHOLD {
        (raw / THRESHOLD).sqrt() * KNEE
    } else {
        let excess = (raw - THRESHOLD) / (1.0 - THRESHOLD);
        KNEE + excess * (1.0 - KNEE)
    }
}

/// Single-pole low-pass, half current and half previous
#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeSmoother {
    value: f32,
}

impl VolumeSmoother {
    pub fn push(&mut self, power_db: f32) -> f32 {
        let level = visual_level(power_to_linear(power_db));
        self.value = 0.5 * level + 0.5 * self.value;
        self.value
    }
}
