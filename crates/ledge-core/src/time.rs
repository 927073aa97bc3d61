use serde::{Deserialize, Serialize};

/// Default simulation tick rate in Hz.
pub const DEFAULT_TICK_RATE_HZ: f32 = 60.0;

/// Longest wall-clock frame the accumulator will absorb (seconds).
pub const DEFAULT_MAX_FRAME_SECS: f32 = 0.25;

/// Highest tick rate a simulation config may ask for (Hz).
pub const MAX_TICK_RATE_HZ: f32 = 1000.0;

/// Fixed-timestep accumulator.
///
/// Wall-clock frame time is added to an accumulator and consumed in whole
/// ticks of `step` seconds. Frames longer than `max_frame` are clamped so a
/// stall does not queue an ever-growing backlog of ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedTimestep {
    step: f32,
    max_frame: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate_hz: f32, max_frame_secs: f32) -> Self {
        Self {
            step: 1.0 / tick_rate_hz,
            max_frame: max_frame_secs,
            accumulator: 0.0,
        }
    }

    /// Tick duration in seconds. Identical for every tick.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add one frame of elapsed time and return how many ticks to run now.
    pub fn advance(&mut self, frame_secs: f32) -> u32 {
        let frame = if !frame_secs.is_finite() || frame_secs < 0.0 {
            0.0
        } else if frame_secs > self.max_frame {
            tracing::warn!(
                frame_secs,
                max_frame_secs = self.max_frame,
                "Frame exceeded max duration, clamping"
            );
            self.max_frame
        } else {
            frame_secs
        };

        self.accumulator += frame;
        let mut ticks = 0;
        while self.accumulator >= self.step {
            let rest = self.accumulator - self.step;
            // A step below the accumulator's precision would never drain it.
            if rest == self.accumulator {
                self.accumulator = 0.0;
                break;
            }
            self.accumulator = rest;
            ticks += 1;
        }
        ticks
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ, DEFAULT_MAX_FRAME_SECS)
    }
}
